#![forbid(unsafe_code)]

//! Layout self-check.
//!
//! [`check_layout`] reports every violation of the packing invariant in one
//! pass. Hosts use it in end-to-end harnesses; the store never needs it.

use crate::item::{Item, ItemId};
use crate::occupancy::OccupancyMap;

/// Result of [`check_layout`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutReport {
    /// Pairs of intersecting items, in collection order.
    pub overlaps: Vec<(ItemId, ItemId)>,
    /// Items with a zero span or extending past the last column.
    pub out_of_bounds: Vec<ItemId>,
    /// Fully empty rows above the lowest occupied row.
    pub empty_rows: Vec<u32>,
    /// One past the lowest occupied row.
    pub bottom: u32,
}

impl LayoutReport {
    /// No overlaps and nothing off-grid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.overlaps.is_empty() && self.out_of_bounds.is_empty()
    }

    /// Valid and free of empty bands.
    #[must_use]
    pub fn is_packed(&self) -> bool {
        self.is_valid() && self.empty_rows.is_empty()
    }

    #[must_use]
    pub fn has_gap(&self) -> bool {
        !self.empty_rows.is_empty()
    }
}

/// Check `items` against a `columns`-wide grid.
#[must_use]
pub fn check_layout(items: &[Item], columns: u32) -> LayoutReport {
    let mut report = LayoutReport::default();
    for (i, a) in items.iter().enumerate() {
        if !a.rect.fits_columns(columns) {
            report.out_of_bounds.push(a.id.clone());
        }
        for b in &items[i + 1..] {
            if a.rect.intersects(&b.rect) {
                report.overlaps.push((a.id.clone(), b.id.clone()));
            }
        }
    }
    let occupancy = OccupancyMap::from_rects(columns, items.iter().map(|item| item.rect));
    report.bottom = occupancy.height();
    report.empty_rows = (0..report.bottom)
        .filter(|&y| occupancy.row_fill(y) == 0)
        .collect();
    report
}
