#![forbid(unsafe_code)]

//! Host pointer samples.
//!
//! Hosts forward raw pointer data as-is. Coordinates are optional because
//! synthetic or malformed events may arrive without them; the interaction
//! layer ignores such samples instead of failing.

use crate::geometry::PixelPoint;

/// Physical pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Part of a tile that received the pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerTarget {
    /// The tile body: starts a move.
    Body,
    /// The resize handle: starts a resize.
    ResizeHandle,
}

/// One pointer sample in viewport (client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: u32,
    pub button: PointerButton,
    pub client_x: Option<f64>,
    pub client_y: Option<f64>,
}

impl PointerSample {
    /// Primary-button sample at `(x, y)`.
    #[must_use]
    pub const fn primary(pointer_id: u32, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            button: PointerButton::Primary,
            client_x: Some(x),
            client_y: Some(y),
        }
    }

    /// Sample with no coordinates.
    #[must_use]
    pub const fn without_position(pointer_id: u32) -> Self {
        Self {
            pointer_id,
            button: PointerButton::Primary,
            client_x: None,
            client_y: None,
        }
    }

    /// Client position, if both coordinates are present and finite.
    #[must_use]
    pub fn position(&self) -> Option<PixelPoint> {
        match (self.client_x, self.client_y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(PixelPoint::new(x, y)),
            _ => None,
        }
    }
}
