#![forbid(unsafe_code)]

//! Core primitives for the Mosaic tile grid.
//!
//! - [`geometry`]: integer grid rectangles, clamping, and pixel points.
//! - [`metrics`]: viewport breakpoints and derived column/row sizes.
//! - [`event`]: host pointer samples fed into the interaction layer.

pub mod event;
pub mod geometry;
pub mod metrics;

pub use event::{PointerButton, PointerSample, PointerTarget};
pub use geometry::{GridRect, MAX_ITEM_ROWS, MAX_ROW, PixelOffset, PixelPoint, clamp};
pub use metrics::{Breakpoints, ColumnTiers, DEFAULT_ASPECT_RATIO, GridMetrics, ViewportClass};
