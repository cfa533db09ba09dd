#![forbid(unsafe_code)]

//! Viewport breakpoints and derived grid cell sizes.
//!
//! The grid uses three width tiers. Each tier maps to a column count, and the
//! row height is always derived from the live column width:
//!
//! ```text
//! column_width = container_width / columns
//! row_height   = column_width * aspect_ratio
//! ```
//!
//! # Invariants
//!
//! 1. Tier classification is monotonic in viewport width.
//! 2. [`GridMetrics`] is only constructed for a finite, positive container
//!    width and a non-zero column count.

use serde::{Deserialize, Serialize};

/// Default height/width ratio of one grid cell.
pub const DEFAULT_ASPECT_RATIO: f64 = 4.0 / 3.0;

/// Viewport width tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportClass {
    Mobile,
    Tablet,
    Desktop,
}

/// Upper viewport widths (inclusive, in CSS pixels) for the narrow tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    pub mobile: f64,
    pub tablet: f64,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            mobile: 576.0,
            tablet: 992.0,
        }
    }
}

impl Breakpoints {
    /// Classify a viewport width.
    ///
    /// Non-finite widths classify as desktop.
    #[must_use]
    pub fn classify(&self, viewport_width: f64) -> ViewportClass {
        if !viewport_width.is_finite() {
            ViewportClass::Desktop
        } else if viewport_width <= self.mobile {
            ViewportClass::Mobile
        } else if viewport_width <= self.tablet {
            ViewportClass::Tablet
        } else {
            ViewportClass::Desktop
        }
    }
}

/// Column count per viewport tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnTiers {
    pub mobile: u32,
    pub tablet: u32,
    pub desktop: u32,
}

impl Default for ColumnTiers {
    fn default() -> Self {
        Self {
            mobile: 2,
            tablet: 5,
            desktop: 10,
        }
    }
}

impl ColumnTiers {
    #[must_use]
    pub const fn for_class(&self, class: ViewportClass) -> u32 {
        match class {
            ViewportClass::Mobile => self.mobile,
            ViewportClass::Tablet => self.tablet,
            ViewportClass::Desktop => self.desktop,
        }
    }

    /// Column count for a viewport width under `breakpoints`.
    #[must_use]
    pub fn columns_for_width(&self, breakpoints: &Breakpoints, viewport_width: f64) -> u32 {
        self.for_class(breakpoints.classify(viewport_width))
    }
}

/// Pixel dimensions of one grid cell for a given container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub columns: u32,
    pub column_width: f64,
    pub row_height: f64,
}

impl GridMetrics {
    /// Derive metrics from the live container width.
    ///
    /// Returns `None` when the container has no usable width, the column
    /// count is zero, or the aspect ratio is not a positive number.
    #[must_use]
    pub fn compute(container_width: f64, columns: u32, aspect_ratio: f64) -> Option<Self> {
        if columns == 0
            || !container_width.is_finite()
            || container_width <= 0.0
            || !aspect_ratio.is_finite()
            || aspect_ratio <= 0.0
        {
            return None;
        }
        let column_width = container_width / f64::from(columns);
        Some(Self {
            columns,
            column_width,
            row_height: column_width * aspect_ratio,
        })
    }

    /// Cell index `(column, row)` under a container-relative pixel position.
    ///
    /// Negative positions map to negative indices; callers clamp.
    #[must_use]
    pub fn cell_at(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.column_width).floor() as i64,
            (y / self.row_height).floor() as i64,
        )
    }

    /// Whole-cell delta `(columns, rows)` for a pixel displacement, rounded
    /// to the nearest cell.
    #[must_use]
    pub fn round_delta(&self, dx: f64, dy: f64) -> (i64, i64) {
        (
            (dx / self.column_width).round() as i64,
            (dy / self.row_height).round() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_tiers_follow_breakpoints() {
        let bp = Breakpoints::default();
        let tiers = ColumnTiers::default();
        assert_eq!(tiers.columns_for_width(&bp, 320.0), 2);
        assert_eq!(tiers.columns_for_width(&bp, 576.0), 2);
        assert_eq!(tiers.columns_for_width(&bp, 577.0), 5);
        assert_eq!(tiers.columns_for_width(&bp, 992.0), 5);
        assert_eq!(tiers.columns_for_width(&bp, 1440.0), 10);
        assert_eq!(tiers.columns_for_width(&bp, f64::NAN), 10);
    }

    #[test]
    fn row_height_follows_aspect_ratio() {
        let m = GridMetrics::compute(1200.0, 10, DEFAULT_ASPECT_RATIO).expect("metrics");
        assert_eq!(m.column_width, 120.0);
        assert!((m.row_height - 160.0).abs() < 1e-9);
        assert_eq!(m.cell_at(250.0, 170.0), (2, 1));
        assert_eq!(m.cell_at(-1.0, 0.0), (-1, 0));
        assert_eq!(m.round_delta(59.0, 81.0), (0, 1));
    }

    #[test]
    fn unusable_container_has_no_metrics() {
        assert!(GridMetrics::compute(0.0, 10, 1.0).is_none());
        assert!(GridMetrics::compute(-5.0, 10, 1.0).is_none());
        assert!(GridMetrics::compute(f64::INFINITY, 10, 1.0).is_none());
        assert!(GridMetrics::compute(800.0, 0, 1.0).is_none());
        assert!(GridMetrics::compute(800.0, 4, 0.0).is_none());
    }

    #[test]
    fn breakpoints_deserialize_with_defaults() {
        let bp: Breakpoints = serde_json::from_str(r#"{"mobile": 480}"#).expect("json");
        assert_eq!(bp.mobile, 480.0);
        assert_eq!(bp.tablet, 992.0);
    }

    proptest! {
        #[test]
        fn classification_is_monotonic(a in 0.0f64..4000.0, b in 0.0f64..4000.0) {
            let bp = Breakpoints::default();
            let tiers = ColumnTiers::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(tiers.columns_for_width(&bp, lo) <= tiers.columns_for_width(&bp, hi));
        }
    }
}
