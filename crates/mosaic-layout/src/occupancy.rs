#![forbid(unsafe_code)]

//! Sparse cell occupancy for first-fit packing.
//!
//! Rows are materialized on first mark; rows that were never marked are
//! empty. The map also tracks `height`, one past the lowest marked row.

use mosaic_core::{GridRect, MAX_ITEM_ROWS, clamp};
use rustc_hash::FxHashMap;

/// Row index to per-column occupancy flags.
#[derive(Debug, Clone, Default)]
pub struct OccupancyMap {
    columns: u32,
    rows: FxHashMap<u32, Vec<bool>>,
    height: u32,
}

impl OccupancyMap {
    #[must_use]
    pub fn new(columns: u32) -> Self {
        Self {
            columns: columns.max(1),
            rows: FxHashMap::default(),
            height: 0,
        }
    }

    /// Build a map with every rectangle marked.
    #[must_use]
    pub fn from_rects<I>(columns: u32, rects: I) -> Self
    where
        I: IntoIterator<Item = GridRect>,
    {
        let mut map = Self::new(columns);
        for rect in rects {
            map.mark(rect);
        }
        map
    }

    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// One past the lowest occupied row.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the cell at `(x, y)` is marked.
    #[must_use]
    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        self.rows
            .get(&y)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Whether `rect` lies on the grid and touches no marked cell.
    #[must_use]
    pub fn is_area_available(&self, rect: GridRect) -> bool {
        if rect.is_empty() || rect.right() > self.columns {
            return false;
        }
        (rect.y..rect.bottom()).all(|y| match self.rows.get(&y) {
            Some(row) => row[rect.x as usize..rect.right() as usize]
                .iter()
                .all(|cell| !cell),
            None => true,
        })
    }

    /// Mark every on-grid cell of `rect`.
    pub fn mark(&mut self, rect: GridRect) {
        let columns = self.columns;
        let right = rect.right().min(columns);
        if rect.x >= right || rect.h == 0 {
            return;
        }
        for y in rect.y..rect.bottom() {
            let row = self
                .rows
                .entry(y)
                .or_insert_with(|| vec![false; columns as usize]);
            row[rect.x as usize..right as usize].fill(true);
        }
        self.height = self.height.max(rect.bottom());
    }

    /// First `w x h` slot in row-major scan order, without marking it.
    ///
    /// `w` is clamped to `[1, columns]` and `h` to `[1, MAX_ITEM_ROWS]`.
    /// Rows at or past [`Self::height`] are empty, so the scan always
    /// terminates.
    #[must_use]
    pub fn first_fit(&self, w: u32, h: u32) -> GridRect {
        let w = clamp(w, 1, self.columns);
        let h = clamp(h, 1, MAX_ITEM_ROWS);
        for y in 0..=self.height {
            for x in 0..=self.columns - w {
                let candidate = GridRect::new(x, y, w, h);
                if self.is_area_available(candidate) {
                    return candidate;
                }
            }
        }
        GridRect::new(0, self.height, w, h)
    }

    /// First-fit and mark in one step.
    pub fn place(&mut self, w: u32, h: u32) -> GridRect {
        let rect = self.first_fit(w, h);
        self.mark(rect);
        rect
    }

    /// Number of occupied cells in row `y`.
    #[must_use]
    pub fn row_fill(&self, y: u32) -> u32 {
        self.rows
            .get(&y)
            .map_or(0, |row| row.iter().filter(|c| **c).count() as u32)
    }
}
