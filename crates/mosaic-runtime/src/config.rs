#![forbid(unsafe_code)]

//! Grid configuration.
//!
//! Every timing and sizing knob of the grid lives in one [`GridConfig`] that
//! can be loaded from JSON (always) or TOML (with the `toml-config` feature).
//!
//! ```toml
//! aspect_ratio = 1.3333
//! drag_commit_interval_ms = 80
//!
//! [columns]
//! mobile = 2
//! tablet = 5
//! desktop = 10
//!
//! [breakpoints]
//! mobile = 576
//! tablet = 992
//! ```
//!
//! Every field has a default, so a partial document only overrides what it
//! names.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "toml-config")]
use std::path::Path;

use mosaic_core::{Breakpoints, ColumnTiers, DEFAULT_ASPECT_RATIO};
use serde::{Deserialize, Serialize};

/// Tunable parameters for the grid engine and its runtime helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Column count per viewport tier.
    pub columns: ColumnTiers,
    /// Viewport width tiers.
    pub breakpoints: Breakpoints,
    /// Row height as a multiple of column width.
    pub aspect_ratio: f64,
    /// Minimum spacing between store commits while dragging.
    pub drag_commit_interval_ms: u64,
    /// Quiet period after the last window resize before columns change.
    pub resize_debounce_ms: u64,
    /// Pointer travel (px) before a press becomes a drag.
    pub drag_threshold_px: f64,
    /// Quiet period after the last change before an autosave snapshot.
    pub autosave_delay_ms: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: ColumnTiers::default(),
            breakpoints: Breakpoints::default(),
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            drag_commit_interval_ms: 80,
            resize_debounce_ms: 100,
            drag_threshold_px: 4.0,
            autosave_delay_ms: 2000,
        }
    }
}

impl GridConfig {
    /// Load from a JSON string and validate.
    pub fn from_json_str(s: &str) -> Result<Self, GridConfigError> {
        let config: Self = serde_json::from_str(s).map_err(GridConfigError::Json)?;
        config.validated()
    }

    /// Load from a TOML string and validate.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, GridConfigError> {
        let config: Self = toml::from_str(s).map_err(GridConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GridConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GridConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("columns.mobile", self.columns.mobile),
            ("columns.tablet", self.columns.tablet),
            ("columns.desktop", self.columns.desktop),
        ] {
            if value == 0 {
                errors.push(format!("{name} must be > 0"));
            }
        }

        if !(self.breakpoints.mobile.is_finite() && self.breakpoints.tablet.is_finite()) {
            errors.push("breakpoints must be finite".into());
        } else if self.breakpoints.mobile > self.breakpoints.tablet {
            errors.push(format!(
                "breakpoints.mobile ({}) must not exceed breakpoints.tablet ({})",
                self.breakpoints.mobile, self.breakpoints.tablet
            ));
        }

        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            errors.push(format!("aspect_ratio must be > 0, got {}", self.aspect_ratio));
        }

        if !self.drag_threshold_px.is_finite() || self.drag_threshold_px < 0.0 {
            errors.push(format!(
                "drag_threshold_px must be >= 0, got {}",
                self.drag_threshold_px
            ));
        }

        errors
    }

    fn validated(self) -> Result<Self, GridConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(GridConfigError::Validation(errors))
        }
    }

    /// Column count for a viewport width.
    #[must_use]
    pub fn columns_for_width(&self, viewport_width: f64) -> u32 {
        self.columns
            .columns_for_width(&self.breakpoints, viewport_width)
            .max(1)
    }

    #[must_use]
    pub const fn drag_commit_interval(&self) -> Duration {
        Duration::from_millis(self.drag_commit_interval_ms)
    }

    #[must_use]
    pub const fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    #[must_use]
    pub const fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

/// Errors from loading a [`GridConfig`].
#[derive(Debug)]
pub enum GridConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "toml-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for GridConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "toml-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for GridConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "toml-config")]
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GridConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.columns_for_width(400.0), 2);
        assert_eq!(config.columns_for_width(800.0), 5);
        assert_eq!(config.columns_for_width(1600.0), 10);
        assert_eq!(config.drag_commit_interval(), Duration::from_millis(80));
    }

    #[test]
    fn partial_json_overrides_named_fields() {
        let config = GridConfig::from_json_str(
            r#"{"columns": {"desktop": 12}, "resize_debounce_ms": 250}"#,
        )
        .expect("valid config");
        assert_eq!(config.columns.desktop, 12);
        assert_eq!(config.columns.mobile, 2);
        assert_eq!(config.resize_debounce_ms, 250);
        assert_eq!(config.autosave_delay_ms, 2000);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = GridConfig::from_json_str(
            r#"{"columns": {"tablet": 0}, "aspect_ratio": -1, "breakpoints": {"mobile": 1200}}"#,
        )
        .expect_err("invalid config");
        let GridConfigError::Validation(errors) = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].contains("columns.tablet"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GridConfig::from_json_str("{").expect_err("parse error");
        assert!(matches!(err, GridConfigError::Json(_)));
        assert!(err.to_string().starts_with("JSON parse error"));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn toml_file_round_trip() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "drag_threshold_px = 6.0\n\n[breakpoints]\nmobile = 480\ntablet = 900\n"
        )
        .expect("write");
        let config = GridConfig::from_toml_file(file.path()).expect("valid toml");
        assert_eq!(config.drag_threshold_px, 6.0);
        assert_eq!(config.breakpoints.mobile, 480.0);
        assert_eq!(config.columns_for_width(950.0), 10);
    }
}
