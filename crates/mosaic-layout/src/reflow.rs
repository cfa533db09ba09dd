#![forbid(unsafe_code)]

//! Deterministic reflow, compaction, and slot queries.
//!
//! # Reflow
//!
//! A reflow re-packs the whole collection with first-fit:
//!
//! 1. The anchor (if any) is clamped onto the grid and marked at its own
//!    position.
//! 2. The remaining items are sorted by `(y, x, id)` and packed in that order.
//! 3. If packing reordered items (a wide item dropped below a narrow one
//!    that was sorted after it), the pass is repeated with the new order until
//!    the order that produced the result is the order the result sorts to.
//!
//! Step 3 makes reflow idempotent: the output of a reflow is always a fixed
//! point, so reflowing it again yields no updates.
//!
//! # Invariants
//!
//! 1. Output rectangles never intersect and fit the column count.
//! 2. The anchor keeps its (clamped) position.
//! 3. Without an anchor, no fully empty row lies above an occupied one.

use std::cmp::Ordering;

use mosaic_core::GridRect;

use crate::item::{Item, ItemId, PositionUpdate};
use crate::occupancy::OccupancyMap;

/// Upper bound on re-sort passes. Random layouts settle in a handful.
const MAX_REFLOW_PASSES: usize = 64;

/// Outcome of a reflow with pass statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflowPlan {
    pub updates: Vec<PositionUpdate>,
    pub passes: usize,
    pub converged: bool,
}

/// Re-pack `items` on a `columns`-wide grid.
///
/// Returns only the position changes, in collection order.
#[must_use]
pub fn reflow(items: &[Item], columns: u32, anchor: Option<&ItemId>) -> Vec<PositionUpdate> {
    plan_reflow(items, columns, anchor).updates
}

/// [`reflow`] with pass statistics.
#[must_use]
pub fn plan_reflow(items: &[Item], columns: u32, anchor: Option<&ItemId>) -> ReflowPlan {
    let columns = columns.max(1);
    let rects: Vec<GridRect> = items
        .iter()
        .map(|item| item.rect.clamp_to_grid(columns))
        .collect();
    let anchor_index = anchor.and_then(|id| items.iter().position(|item| &item.id == id));

    let pending: Vec<usize> = (0..items.len())
        .filter(|&i| Some(i) != anchor_index)
        .collect();
    let mut order = sorted_order(&pending, items, &rects);
    let mut placed = rects.clone();
    let mut passes = 0;
    let mut converged = false;

    while passes < MAX_REFLOW_PASSES {
        passes += 1;
        let mut occupancy = OccupancyMap::new(columns);
        if let Some(a) = anchor_index {
            occupancy.mark(rects[a]);
        }
        for &i in &order {
            placed[i] = occupancy.place(rects[i].w, rects[i].h);
        }
        let next = sorted_order(&pending, items, &placed);
        if next == order {
            converged = true;
            break;
        }
        order = next;
    }

    let updates = items
        .iter()
        .zip(&placed)
        .filter(|(item, rect)| item.rect.x != rect.x || item.rect.y != rect.y)
        .map(|(item, rect)| PositionUpdate {
            id: item.id.clone(),
            x: rect.x,
            y: rect.y,
        })
        .collect();

    ReflowPlan {
        updates,
        passes,
        converged,
    }
}

/// Move every item (except `exclude`) to the earliest row where it fits.
///
/// Items are visited in `(y, x, id)` order. Each one first tries its own
/// column from row 0 down to its current row; only if that fails does it
/// fall back to a full first-fit scan. This keeps items in their columns
/// where possible, unlike [`reflow`].
#[must_use]
pub fn compact(items: &[Item], columns: u32, exclude: Option<&ItemId>) -> Vec<PositionUpdate> {
    let columns = columns.max(1);
    let rects: Vec<GridRect> = items
        .iter()
        .map(|item| item.rect.clamp_to_grid(columns))
        .collect();
    let mut occupancy = OccupancyMap::new(columns);
    let mut pending = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if exclude == Some(&item.id) {
            occupancy.mark(rects[i]);
        } else {
            pending.push(i);
        }
    }
    let order = sorted_order(&pending, items, &rects);

    let mut updates = Vec::new();
    for i in order {
        let rect = rects[i];
        // Rows at or past the map height are free, so the scan can stop there.
        let target = (0..=rect.y.min(occupancy.height()))
            .map(|y| rect.at(rect.x, y))
            .find(|candidate| occupancy.is_area_available(*candidate))
            .unwrap_or_else(|| occupancy.first_fit(rect.w, rect.h));
        occupancy.mark(target);
        if target.x != items[i].rect.x || target.y != items[i].rect.y {
            updates.push(PositionUpdate {
                id: items[i].id.clone(),
                x: target.x,
                y: target.y,
            });
        }
    }
    updates
}

/// First free `w x h` slot given the current items. Nothing is mutated.
#[must_use]
pub fn first_available_slot(items: &[Item], columns: u32, w: u32, h: u32) -> GridRect {
    OccupancyMap::from_rects(columns, items.iter().map(|item| item.rect)).first_fit(w, h)
}

/// Lowest occupied row + 1, ignoring `exclude`.
#[must_use]
pub fn content_bottom(items: &[Item], exclude: Option<&ItemId>) -> u32 {
    items
        .iter()
        .filter(|item| exclude != Some(&item.id))
        .map(|item| item.rect.bottom())
        .max()
        .unwrap_or(0)
}

fn sorted_order(indices: &[usize], items: &[Item], rects: &[GridRect]) -> Vec<usize> {
    let mut order = indices.to_vec();
    order.sort_by(|&a, &b| reading_order(a, b, items, rects));
    order
}

fn reading_order(a: usize, b: usize, items: &[Item], rects: &[GridRect]) -> Ordering {
    rects[a]
        .y
        .cmp(&rects[b].y)
        .then(rects[a].x.cmp(&rects[b].x))
        .then_with(|| items[a].id.cmp(&items[b].id))
        .then(a.cmp(&b))
}
