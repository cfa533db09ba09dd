#![forbid(unsafe_code)]

//! Move/resize gesture lifecycle.
//!
//! ```text
//! Idle -> Dragging -> Idle
//! Idle -> Resizing -> Idle
//! ```
//!
//! [`InteractionMachine`] is pure: it turns pointer samples into candidate
//! grid rectangles and reports what happened as an [`InteractionEffect`].
//! It never touches the store; the engine decides what to commit.
//!
//! # Candidate geometry
//!
//! - **Move**: the cell under the pointer minus the cell offset at which the
//!   tile was grabbed. `x` is clamped to `[0, C - w]`, `y` to
//!   `[0, max_row]` where `max_row` is the bottom of the other tiles, so a
//!   drag can never open an empty band.
//! - **Resize**: `w = clamp(w0 + round(dx / column_width), 1, C - x0)`,
//!   `h = max(1, h0 + round(dy / row_height))`.
//!
//! A gesture only counts as moved once the pointer has travelled at least
//! the drag threshold; a release before that is a click.

use std::fmt;

use mosaic_core::{GridMetrics, GridRect, PixelOffset, PixelPoint, PointerButton, PointerSample};
use mosaic_layout::ItemId;

/// Default pointer travel in pixels before a press becomes a drag.
pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 4.0;

/// Which gesture a pointer-down starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Move,
    Resize,
}

/// Everything the machine needs to start a gesture, read fresh from the
/// store and the container at pointer-down.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureRequest {
    pub kind: InteractionKind,
    pub item_id: ItemId,
    /// Live rectangle of the item.
    pub rect: GridRect,
    pub metrics: GridMetrics,
    pub container_origin: PixelPoint,
    /// Lowest row the item may be dragged to.
    pub max_row: u32,
}

/// State of one active gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub kind: InteractionKind,
    pub item_id: ItemId,
    pub pointer_id: u32,
    pub origin: PixelPoint,
    pub current: PixelPoint,
    pub start: GridRect,
    pub candidate: GridRect,
    /// Cell offset `(column, row)` inside the tile where it was grabbed.
    pub grab: (u32, u32),
    pub metrics: GridMetrics,
    pub container_origin: PixelPoint,
    pub max_row: u32,
    pub moved: bool,
}

impl Gesture {
    /// Pixel displacement since pointer-down.
    #[must_use]
    pub fn offset(&self) -> PixelOffset {
        self.current.offset_from(self.origin)
    }

    fn candidate_for(&self, position: PixelPoint) -> GridRect {
        match self.kind {
            InteractionKind::Move => self.move_candidate(position),
            InteractionKind::Resize => self.resize_candidate(position),
        }
    }

    fn move_candidate(&self, position: PixelPoint) -> GridRect {
        let rel = position.offset_from(self.container_origin);
        let (col, row) = self.metrics.cell_at(rel.dx, rel.dy);
        let columns = i64::from(self.metrics.columns);
        let w = i64::from(self.start.w);
        let x = (col - i64::from(self.grab.0)).clamp(0, (columns - w).max(0));
        let y = (row - i64::from(self.grab.1)).clamp(0, i64::from(self.max_row));
        self.start.at(to_u32(x), to_u32(y))
    }

    fn resize_candidate(&self, position: PixelPoint) -> GridRect {
        let delta = position.offset_from(self.origin);
        let (dc, dr) = self.metrics.round_delta(delta.dx, delta.dy);
        let max_w = (i64::from(self.metrics.columns) - i64::from(self.start.x)).max(1);
        let w = (i64::from(self.start.w) + dc).clamp(1, max_w);
        let h = (i64::from(self.start.h) + dr).max(1);
        GridRect::new(self.start.x, self.start.y, to_u32(w), to_u32(h))
    }
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Lifecycle state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(Gesture),
    Resizing(Gesture),
}

impl InteractionState {
    #[must_use]
    pub fn gesture(&self) -> Option<&Gesture> {
        match self {
            Self::Idle => None,
            Self::Dragging(g) | Self::Resizing(g) => Some(g),
        }
    }

    fn gesture_mut(&mut self) -> Option<&mut Gesture> {
        match self {
            Self::Idle => None,
            Self::Dragging(g) | Self::Resizing(g) => Some(g),
        }
    }
}

/// Why an input was safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionNoopReason {
    /// Move/up/cancel with no gesture in progress.
    Idle,
    AlreadyActive,
    PointerMismatch,
    MissingCoordinates,
    ButtonNotAllowed,
    BelowThreshold,
    EditModeDisabled,
    /// Store, surface, container, or item missing.
    Unavailable,
}

/// How a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The pointer moved: commit this rectangle.
    Commit(GridRect),
    /// The pointer never moved meaningfully.
    Click,
}

/// Result of one lifecycle step.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEffect {
    Started {
        kind: InteractionKind,
        item_id: ItemId,
        pointer_id: u32,
    },
    Preview {
        kind: InteractionKind,
        offset: PixelOffset,
        candidate: GridRect,
        candidate_changed: bool,
    },
    Finished {
        kind: InteractionKind,
        item_id: ItemId,
        pointer_id: u32,
        outcome: GestureOutcome,
    },
    Noop {
        reason: InteractionNoopReason,
    },
}

impl InteractionEffect {
    #[must_use]
    pub const fn noop(reason: InteractionNoopReason) -> Self {
        Self::Noop { reason }
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop { .. })
    }
}

/// Construction errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionMachineError {
    InvalidDragThreshold { threshold: f64 },
}

impl fmt::Display for InteractionMachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDragThreshold { threshold } => {
                write!(
                    f,
                    "invalid drag threshold {threshold} (must be finite and >= 0)"
                )
            }
        }
    }
}

impl std::error::Error for InteractionMachineError {}

/// Deterministic move/resize lifecycle machine.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMachine {
    state: InteractionState,
    drag_threshold: f64,
    transition_counter: u64,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self {
            state: InteractionState::Idle,
            drag_threshold: DEFAULT_DRAG_THRESHOLD_PX,
            transition_counter: 0,
        }
    }
}

impl InteractionMachine {
    /// Machine with an explicit drag threshold in pixels.
    pub fn new(drag_threshold: f64) -> Result<Self, InteractionMachineError> {
        if !drag_threshold.is_finite() || drag_threshold < 0.0 {
            return Err(InteractionMachineError::InvalidDragThreshold {
                threshold: drag_threshold,
            });
        }
        Ok(Self {
            drag_threshold,
            ..Self::default()
        })
    }

    #[must_use]
    pub const fn state(&self) -> &InteractionState {
        &self.state
    }

    #[must_use]
    pub fn gesture(&self) -> Option<&Gesture> {
        self.state.gesture()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, InteractionState::Idle)
    }

    #[must_use]
    pub const fn drag_threshold(&self) -> f64 {
        self.drag_threshold
    }

    /// Number of non-noop transitions so far.
    #[must_use]
    pub const fn transition_count(&self) -> u64 {
        self.transition_counter
    }

    /// Pointer-down.
    pub fn begin(&mut self, request: GestureRequest, sample: &PointerSample) -> InteractionEffect {
        if self.is_active() {
            return InteractionEffect::noop(InteractionNoopReason::AlreadyActive);
        }
        if sample.button != PointerButton::Primary {
            return InteractionEffect::noop(InteractionNoopReason::ButtonNotAllowed);
        }
        let Some(position) = sample.position() else {
            return InteractionEffect::noop(InteractionNoopReason::MissingCoordinates);
        };

        let rel = position.offset_from(request.container_origin);
        let (col, row) = request.metrics.cell_at(rel.dx, rel.dy);
        let grab_x = (col - i64::from(request.rect.x)).clamp(0, (i64::from(request.rect.w) - 1).max(0));
        let grab_y = (row - i64::from(request.rect.y)).clamp(0, (i64::from(request.rect.h) - 1).max(0));

        let gesture = Gesture {
            kind: request.kind,
            item_id: request.item_id.clone(),
            pointer_id: sample.pointer_id,
            origin: position,
            current: position,
            start: request.rect,
            candidate: request.rect,
            grab: (to_u32(grab_x), to_u32(grab_y)),
            metrics: request.metrics,
            container_origin: request.container_origin,
            max_row: request.max_row.max(request.rect.y),
            moved: false,
        };
        self.state = match request.kind {
            InteractionKind::Move => InteractionState::Dragging(gesture),
            InteractionKind::Resize => InteractionState::Resizing(gesture),
        };
        self.bump();
        InteractionEffect::Started {
            kind: request.kind,
            item_id: request.item_id,
            pointer_id: sample.pointer_id,
        }
    }

    /// Pointer-move.
    pub fn update(&mut self, sample: &PointerSample) -> InteractionEffect {
        let threshold = self.drag_threshold;
        let Some(gesture) = self.state.gesture_mut() else {
            return InteractionEffect::noop(InteractionNoopReason::Idle);
        };
        if gesture.pointer_id != sample.pointer_id {
            return InteractionEffect::noop(InteractionNoopReason::PointerMismatch);
        }
        let Some(position) = sample.position() else {
            return InteractionEffect::noop(InteractionNoopReason::MissingCoordinates);
        };

        gesture.current = position;
        if !gesture.moved {
            let d2 = gesture.offset().length_squared();
            if d2 == 0.0 || d2 < threshold * threshold {
                return InteractionEffect::noop(InteractionNoopReason::BelowThreshold);
            }
            gesture.moved = true;
        }

        let candidate = gesture.candidate_for(position);
        let candidate_changed = candidate != gesture.candidate;
        gesture.candidate = candidate;
        let effect = InteractionEffect::Preview {
            kind: gesture.kind,
            offset: gesture.offset(),
            candidate,
            candidate_changed,
        };
        self.bump();
        effect
    }

    /// Pointer-up. A final position, when present, is applied first.
    pub fn finish(&mut self, sample: &PointerSample) -> InteractionEffect {
        match self.state.gesture() {
            None => return InteractionEffect::noop(InteractionNoopReason::Idle),
            Some(g) if g.pointer_id != sample.pointer_id => {
                return InteractionEffect::noop(InteractionNoopReason::PointerMismatch);
            }
            Some(_) => {}
        }
        if sample.position().is_some() {
            let _ = self.update(sample);
        }
        self.end()
    }

    /// Pointer-cancel. Ends like a release at the last known position.
    pub fn cancel(&mut self, pointer_id: u32) -> InteractionEffect {
        match self.state.gesture() {
            None => InteractionEffect::noop(InteractionNoopReason::Idle),
            Some(g) if g.pointer_id != pointer_id => {
                InteractionEffect::noop(InteractionNoopReason::PointerMismatch)
            }
            Some(_) => self.end(),
        }
    }

    /// Drop any gesture without an outcome, returning it.
    pub fn force_reset(&mut self) -> Option<Gesture> {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => None,
            InteractionState::Dragging(g) | InteractionState::Resizing(g) => {
                self.bump();
                Some(g)
            }
        }
    }

    fn end(&mut self) -> InteractionEffect {
        let Some(gesture) = self.force_reset() else {
            return InteractionEffect::noop(InteractionNoopReason::Idle);
        };
        let outcome = if gesture.moved {
            GestureOutcome::Commit(gesture.candidate)
        } else {
            GestureOutcome::Click
        };
        InteractionEffect::Finished {
            kind: gesture.kind,
            item_id: gesture.item_id,
            pointer_id: gesture.pointer_id,
            outcome,
        }
    }

    fn bump(&mut self) {
        self.transition_counter = self.transition_counter.saturating_add(1);
    }
}
