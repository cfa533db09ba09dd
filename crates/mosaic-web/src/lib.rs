#![forbid(unsafe_code)]

//! `mosaic-web` drives the Mosaic tile grid from a host environment.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes pointer events,
//!   viewport sizes, and time.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **Keyed rendering**: the view is a pure function of the items; the host
//!   surface receives keyed child-list operations.
//!
//! The crate does not bind to a browser API. A host implements
//! [`GridSurface`] over its own retained tree; [`RecordingSurface`] is the
//! headless implementation used in tests.

pub mod clock;
pub mod engine;
pub mod interaction;
pub mod surface;
pub mod view;

pub use clock::DeterministicClock;
pub use engine::{GridEngine, GridEngineOptions, TextStylePatch};
pub use interaction::{
    DEFAULT_DRAG_THRESHOLD_PX, Gesture, GestureOutcome, GestureRequest, InteractionEffect,
    InteractionKind, InteractionMachine, InteractionMachineError, InteractionNoopReason,
    InteractionState,
};
pub use surface::{GridSurface, PointerCaptureCommand, RecordingSurface};
pub use view::{
    EMPTY_GALLERY_MESSAGE, GridPlacement, InteractionMode, InteractionOverlay, MediaSource,
    RenderContext, TileBody, TileView, ViewOp, ViewTree, apply_ops, diff_views, render_view,
};
