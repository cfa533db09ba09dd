#![forbid(unsafe_code)]

//! Host surface the grid engine renders into.
//!
//! The engine owns the surface's managed child list and talks to it only
//! through [`GridSurface`]: it asks for the container geometry, hands over
//! keyed [`ViewOp`]s, and issues pointer-capture commands. Hosts map these
//! onto whatever retained tree they have.

use mosaic_core::PixelPoint;
use mosaic_layout::ItemId;

use crate::view::{TileView, ViewOp, ViewTree, apply_ops};

/// Host command for browser-style pointer capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerCaptureCommand {
    Acquire { pointer_id: u32 },
    Release { pointer_id: u32 },
}

impl PointerCaptureCommand {
    #[must_use]
    pub const fn pointer_id(self) -> u32 {
        match self {
            Self::Acquire { pointer_id } | Self::Release { pointer_id } => pointer_id,
        }
    }
}

/// Container the engine renders tiles into.
pub trait GridSurface {
    /// Current content width in pixels. `None` when the container is not
    /// attached; every geometry-dependent entry point is then a no-op.
    fn container_width(&self) -> Option<f64>;

    /// Top-left of the container in pointer coordinates.
    fn container_origin(&self) -> PixelPoint {
        PixelPoint::new(0.0, 0.0)
    }

    /// Apply keyed child-list operations, in order.
    fn apply(&mut self, ops: &[ViewOp]);

    /// Acquire or release pointer capture.
    fn pointer_capture(&mut self, _command: PointerCaptureCommand) {}
}

/// Headless surface that mirrors the child list and records everything.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: Option<f64>,
    origin: PixelPoint,
    tree: ViewTree,
    ops: Vec<ViewOp>,
    captures: Vec<PointerCaptureCommand>,
    apply_count: usize,
}

impl RecordingSurface {
    /// Attached surface of the given width at origin `(0, 0)`.
    #[must_use]
    pub fn new(width: f64) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    /// Surface with no container.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_origin(mut self, origin: PixelPoint) -> Self {
        self.origin = origin;
        self
    }

    pub fn set_width(&mut self, width: Option<f64>) {
        self.width = width;
    }

    #[must_use]
    pub fn tiles(&self) -> &[TileView] {
        &self.tree.tiles
    }

    #[must_use]
    pub fn tile(&self, id: &ItemId) -> Option<&TileView> {
        self.tree.tile(id)
    }

    #[must_use]
    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    #[must_use]
    pub fn shows_empty_placeholder(&self) -> bool {
        self.tree.empty_placeholder
    }

    /// Every op applied so far.
    #[must_use]
    pub fn ops(&self) -> &[ViewOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<ViewOp> {
        std::mem::take(&mut self.ops)
    }

    #[must_use]
    pub fn captures(&self) -> &[PointerCaptureCommand] {
        &self.captures
    }

    /// Number of non-empty `apply` calls.
    #[must_use]
    pub const fn apply_count(&self) -> usize {
        self.apply_count
    }
}

impl GridSurface for RecordingSurface {
    fn container_width(&self) -> Option<f64> {
        self.width
    }

    fn container_origin(&self) -> PixelPoint {
        self.origin
    }

    fn apply(&mut self, ops: &[ViewOp]) {
        if ops.is_empty() {
            return;
        }
        apply_ops(&mut self.tree, ops);
        self.ops.extend_from_slice(ops);
        self.apply_count += 1;
    }

    fn pointer_capture(&mut self, command: PointerCaptureCommand) {
        self.captures.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_surface_has_no_width() {
        assert_eq!(RecordingSurface::detached().container_width(), None);
        assert_eq!(RecordingSurface::new(640.0).container_width(), Some(640.0));
    }

    #[test]
    fn empty_apply_is_not_counted() {
        let mut surface = RecordingSurface::new(100.0);
        surface.apply(&[]);
        assert_eq!(surface.apply_count(), 0);
        surface.apply(&[ViewOp::SetEmpty(true)]);
        assert_eq!(surface.apply_count(), 1);
        assert!(surface.shows_empty_placeholder());
        assert_eq!(surface.take_ops().len(), 1);
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn capture_commands_are_logged() {
        let mut surface = RecordingSurface::new(100.0);
        surface.pointer_capture(PointerCaptureCommand::Acquire { pointer_id: 3 });
        surface.pointer_capture(PointerCaptureCommand::Release { pointer_id: 3 });
        assert_eq!(surface.captures().len(), 2);
        assert_eq!(surface.captures()[1].pointer_id(), 3);
    }
}
