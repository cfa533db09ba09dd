#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Grid space is measured in whole cells with the origin at the top-left
//! cell. Columns are bounded by the active column count. Rows grow downward
//! up to [`MAX_ROW`], and no item is taller than [`MAX_ITEM_ROWS`]; saved or
//! host-supplied geometry beyond those bounds is clamped, never trusted.

use serde::{Deserialize, Serialize};

/// Tallest item, in rows.
pub const MAX_ITEM_ROWS: u32 = 1024;

/// Lowest row an item may start on.
pub const MAX_ROW: u32 = 1 << 20;

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`Ord::clamp`] this never panics: when `min > max` the lower bound
/// wins, which is what the grid wants when an item is wider than the grid.
#[inline]
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        if max < min { min } else { max }
    } else {
        value
    }
}

/// A rectangle of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridRect {
    /// Left column (inclusive).
    pub x: u32,
    /// Top row (inclusive).
    pub y: u32,
    /// Width in columns.
    pub w: u32,
    /// Height in rows.
    pub h: u32,
}

impl GridRect {
    /// Create a new grid rectangle.
    #[inline]
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Check if a cell is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether two rectangles share at least one cell.
    ///
    /// Edge-adjacent rectangles do not intersect.
    #[inline]
    pub const fn intersects(&self, other: &GridRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Compute the intersection with another rectangle, if any.
    pub fn intersection_opt(&self, other: &GridRect) -> Option<GridRect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Some(GridRect {
            x,
            y,
            w: self.right().min(other.right()) - x,
            h: self.bottom().min(other.bottom()) - y,
        })
    }

    /// Whether the rectangle lies fully inside `[0, columns)` horizontally
    /// with a non-zero size.
    #[inline]
    pub const fn fits_columns(&self, columns: u32) -> bool {
        self.w >= 1 && self.h >= 1 && self.right() <= columns
    }

    /// Clamp the rectangle onto a `columns`-wide grid.
    ///
    /// Width is clamped to `[1, columns]`, `x` to `[0, columns - w]`, the
    /// height to `[1, MAX_ITEM_ROWS]`, and `y` to `[0, MAX_ROW]`.
    #[must_use]
    pub fn clamp_to_grid(self, columns: u32) -> GridRect {
        let columns = columns.max(1);
        let w = clamp(self.w, 1, columns);
        let x = clamp(self.x, 0, columns - w);
        GridRect {
            x,
            y: self.y.min(MAX_ROW),
            w,
            h: clamp(self.h, 1, MAX_ITEM_ROWS),
        }
    }

    /// Same rectangle moved to `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn at(self, x: u32, y: u32) -> GridRect {
        GridRect { x, y, ..self }
    }
}

/// A point in container-relative pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset from `origin` to `self`.
    #[inline]
    pub fn offset_from(self, origin: PixelPoint) -> PixelOffset {
        PixelOffset {
            dx: self.x - origin.x,
            dy: self.y - origin.y,
        }
    }
}

/// A pixel-space displacement, used for the drag transform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelOffset {
    pub dx: f64,
    pub dy: f64,
}

impl PixelOffset {
    #[inline]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Squared euclidean length.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dx * self.dx + self.dy * self.dy
    }
}
