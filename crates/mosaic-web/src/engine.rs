#![forbid(unsafe_code)]

//! Grid engine: store subscription, keyed rendering, and pointer gestures.
//!
//! # Design
//!
//! [`GridEngine`] is constructed with its collaborators injected: an
//! [`ItemStore`], a [`GridSurface`], and a [`GridConfig`]. It subscribes to
//! the store and re-renders on every notification by diffing the new
//! [`ViewTree`](crate::view::ViewTree) against the last one.
//!
//! Pointer input goes through an [`InteractionMachine`]. While a tile is
//! dragged, candidate positions are committed to the store at most once per
//! `drag_commit_interval` (latest candidate wins) so neighbours resettle
//! during the drag. Resizes only preview. Release commits the final
//! rectangle and the anchored reflow inside one store batch.
//!
//! The engine never reads wall time. Every timed entry point takes the
//! host's monotonic `now`; [`GridEngine::tick`] fires due timers.
//!
//! # Failure Modes
//!
//! Without a store every entry point is a no-op. Without a surface, or when
//! the surface reports no container width, rendering and gestures are
//! no-ops; store-only operations (reflow, add, delete) still work.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use mosaic_core::{
    GridMetrics, GridRect, MAX_ITEM_ROWS, PixelOffset, PointerSample, PointerTarget,
};
use mosaic_layout::{
    Item, ItemId, ItemPatch, ItemType, LayoutReport, PositionPatch, RawItem, TextAlign,
    check_layout, content_bottom,
};
use mosaic_runtime::{Debouncer, GridConfig, ItemStore, Subscription};
use tracing::{debug, trace};

use crate::clock::DeterministicClock;
use crate::interaction::{
    GestureOutcome, GestureRequest, InteractionEffect, InteractionKind, InteractionMachine,
    InteractionMachineError, InteractionNoopReason, InteractionState,
};
use crate::surface::{GridSurface, PointerCaptureCommand};
use crate::view::{
    InteractionMode, InteractionOverlay, RenderContext, ViewTree, diff_views, render_view,
};

type SelectionCallback = Rc<dyn Fn(Option<&Item>)>;

/// Construction options for [`GridEngine`].
pub struct GridEngineOptions<S> {
    pub store: Option<ItemStore>,
    pub surface: Option<S>,
    pub config: GridConfig,
    /// Initial viewport width. When set, the store's column count follows
    /// the breakpoint tier for it.
    pub viewport_width: Option<f64>,
    pub edit_mode: bool,
}

impl<S> GridEngineOptions<S> {
    #[must_use]
    pub fn new(store: ItemStore, surface: S) -> Self {
        Self {
            store: Some(store),
            surface: Some(surface),
            config: GridConfig::default(),
            viewport_width: None,
            edit_mode: false,
        }
    }

    #[must_use]
    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn viewport_width(mut self, width: f64) -> Self {
        self.viewport_width = Some(width);
        self
    }

    #[must_use]
    pub fn edit_mode(mut self, edit_mode: bool) -> Self {
        self.edit_mode = edit_mode;
        self
    }
}

/// Style change for the selected text tile. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextStylePatch {
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub font_size: Option<u32>,
    pub text_align: Option<Option<TextAlign>>,
}

impl TextStylePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bg_color.is_none()
            && self.text_color.is_none()
            && self.font_size.is_none()
            && self.text_align.is_none()
    }

    fn into_item_patch(self) -> ItemPatch {
        ItemPatch {
            bg_color: self.bg_color,
            text_color: self.text_color,
            font_size: self.font_size.map(|size| size.max(1)),
            text_align: self.text_align,
            ..ItemPatch::default()
        }
    }
}

struct RenderState<S> {
    surface: S,
    last: ViewTree,
    selected: Option<ItemId>,
    edit_mode: bool,
    overlay: Option<InteractionOverlay>,
    on_selected: Option<SelectionCallback>,
}

impl<S: GridSurface> RenderState<S> {
    /// Re-render against `items`. Returns the selection callback when the
    /// selected item disappeared; the caller runs it after releasing the
    /// borrow.
    fn sync(&mut self, items: &[Item]) -> Option<SelectionCallback> {
        let mut cleared = None;
        if let Some(selected) = &self.selected
            && !items.iter().any(|item| &item.id == selected)
        {
            trace!(%selected, "selected item removed; clearing selection");
            self.selected = None;
            cleared = self.on_selected.clone();
        }
        if let Some(overlay) = &self.overlay
            && !items.iter().any(|item| item.id == overlay.item_id)
        {
            self.overlay = None;
        }

        if self.surface.container_width().is_none() {
            return cleared;
        }
        let ctx = RenderContext {
            selected: self.selected.as_ref(),
            edit_mode: self.edit_mode,
            overlay: self.overlay.as_ref(),
        };
        let next = render_view(items, &ctx);
        let ops = diff_views(&self.last, &next);
        if !ops.is_empty() {
            trace!(ops = ops.len(), tiles = next.tiles.len(), "render diff applied");
            self.surface.apply(&ops);
        }
        self.last = next;
        cleared
    }
}

/// Grid engine bound to one store and one surface.
pub struct GridEngine<S: GridSurface + 'static> {
    store: Option<ItemStore>,
    render: Option<Rc<RefCell<RenderState<S>>>>,
    subscription: Option<Subscription>,
    config: GridConfig,
    machine: InteractionMachine,
    clock: DeterministicClock,
    drag_commit: Debouncer,
    pending_commit: Option<GridRect>,
    last_committed: Option<GridRect>,
    resize: Debouncer,
    viewport_width: Option<f64>,
    viewport_dirty: bool,
}

impl<S: GridSurface + 'static> fmt::Debug for GridEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridEngine")
            .field("store", &self.store)
            .field("has_surface", &self.render.is_some())
            .field("machine", &self.machine)
            .field("now", &self.clock.now())
            .field("viewport_width", &self.viewport_width)
            .finish_non_exhaustive()
    }
}

impl<S: GridSurface + 'static> GridEngine<S> {
    /// Build the engine, subscribe to the store, and render once.
    pub fn new(options: GridEngineOptions<S>) -> Result<Self, InteractionMachineError> {
        let GridEngineOptions {
            store,
            surface,
            config,
            viewport_width,
            edit_mode,
        } = options;

        let machine = InteractionMachine::new(config.drag_threshold_px)?;
        let render = surface.map(|surface| {
            Rc::new(RefCell::new(RenderState {
                surface,
                last: ViewTree::default(),
                selected: None,
                edit_mode,
                overlay: None,
                on_selected: None,
            }))
        });

        if let (Some(store), Some(width)) = (&store, viewport_width) {
            store.set_columns(config.columns_for_width(width));
        }

        let subscription = match (&store, &render) {
            (Some(store), Some(render)) => {
                let weak = Rc::downgrade(render);
                Some(store.subscribe(move |items| {
                    let Some(render) = weak.upgrade() else {
                        return;
                    };
                    let cleared = render.borrow_mut().sync(items);
                    if let Some(callback) = cleared {
                        callback(None);
                    }
                }))
            }
            _ => None,
        };

        debug!(
            has_store = store.is_some(),
            has_surface = render.is_some(),
            edit_mode,
            "grid engine created"
        );

        Ok(Self {
            store,
            render,
            subscription,
            drag_commit: Debouncer::throttle(config.drag_commit_interval()),
            resize: Debouncer::trailing(config.resize_debounce()),
            config,
            machine,
            clock: DeterministicClock::new(),
            pending_commit: None,
            last_committed: None,
            viewport_width,
            viewport_dirty: false,
        })
    }

    // --- Accessors ---------------------------------------------------------

    #[must_use]
    pub const fn store(&self) -> Option<&ItemStore> {
        self.store.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    #[must_use]
    pub const fn interaction_state(&self) -> &InteractionState {
        self.machine.state()
    }

    /// Host time as last reported.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock.now()
    }

    #[must_use]
    pub fn edit_mode(&self) -> bool {
        self.render
            .as_ref()
            .is_some_and(|render| render.borrow().edit_mode)
    }

    #[must_use]
    pub fn selected(&self) -> Option<ItemId> {
        self.render
            .as_ref()
            .and_then(|render| render.borrow().selected.clone())
    }

    /// Whether the engine is subscribed to a store with a surface attached.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Cell metrics for the live container width.
    #[must_use]
    pub fn metrics(&self) -> Option<GridMetrics> {
        let store = self.store.as_ref()?;
        let width = self.render.as_ref()?.borrow().surface.container_width()?;
        GridMetrics::compute(width, store.columns(), self.config.aspect_ratio)
    }

    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        self.render.as_ref().map(|render| f(&render.borrow().surface))
    }

    pub fn with_surface_mut<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        self.render
            .as_ref()
            .map(|render| f(&mut render.borrow_mut().surface))
    }

    // --- Selection and editing ---------------------------------------------

    /// Toggle edit mode. Turning it off abandons any gesture in progress.
    pub fn set_edit_mode(&mut self, edit_mode: bool) {
        let Some(render) = self.render.clone() else {
            return;
        };
        if render.borrow().edit_mode == edit_mode {
            return;
        }
        render.borrow_mut().edit_mode = edit_mode;
        if !edit_mode {
            self.abandon_gesture();
        }
        debug!(edit_mode, "edit mode changed");
        self.rerender();
    }

    /// Select an item, or clear the selection with `None`.
    ///
    /// Unknown ids clear the selection. The selection callback runs with the
    /// selected item's current state.
    pub fn select_item(&mut self, id: Option<&ItemId>) {
        let (Some(store), Some(render)) = (self.store.clone(), self.render.clone()) else {
            return;
        };
        let item = id.and_then(|id| store.find_item(id).map(|item| item.clone()));
        let callback = {
            let mut render = render.borrow_mut();
            render.selected = item.as_ref().map(|item| item.id.clone());
            render.on_selected.clone()
        };
        self.rerender();
        if let Some(callback) = callback {
            callback(item.as_ref());
        }
    }

    /// Register the selection callback, replacing any previous one.
    pub fn on_item_selected(&mut self, callback: impl Fn(Option<&Item>) + 'static) {
        if let Some(render) = &self.render {
            render.borrow_mut().on_selected = Some(Rc::new(callback));
        }
    }

    /// Apply a style change to the selected tile if it is a text tile.
    pub fn apply_text_style(&mut self, patch: TextStylePatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let Some((store, id)) = self.selected_of_kind(&[ItemType::Text]) else {
            return false;
        };
        store.update_item(&id, patch.into_item_patch())
    }

    /// Replace the body text of the selected text or placeholder tile.
    pub fn edit_selected_text(&mut self, content: impl Into<String>) -> bool {
        let Some((store, id)) = self.selected_of_kind(&[ItemType::Text, ItemType::Placeholder])
        else {
            return false;
        };
        store.update_item(&id, ItemPatch::default().content(content))
    }

    fn selected_of_kind(&self, kinds: &[ItemType]) -> Option<(ItemStore, ItemId)> {
        let store = self.store.clone()?;
        let id = self.selected()?;
        let kind = store.find_item(&id)?.kind();
        kinds.contains(&kind).then_some((store, id))
    }

    // --- Grid operations ---------------------------------------------------

    /// Full re-pack, optionally anchored. Returns how many items moved.
    pub fn reflow_grid(&mut self, anchor: Option<&ItemId>) -> usize {
        self.store.as_ref().map_or(0, |store| store.reflow(anchor))
    }

    /// Conservative compaction. Returns how many items moved.
    pub fn compact_grid(&mut self, exclude: Option<&ItemId>) -> usize {
        self.store
            .as_ref()
            .map_or(0, |store| store.compact(exclude))
    }

    #[must_use]
    pub fn first_available_slot(&self, w: u32, h: u32) -> Option<GridRect> {
        self.store
            .as_ref()
            .map(|store| store.first_available_slot(w, h))
    }

    #[must_use]
    pub fn layout_report(&self) -> Option<LayoutReport> {
        let store = self.store.as_ref()?;
        Some(store.with_items(|items| check_layout(items, store.columns())))
    }

    /// Add an item at the first available slot.
    pub fn add_item(&mut self, mut raw: RawItem) -> Option<Item> {
        let store = self.store.as_ref()?;
        let (w, h) = requested_span(&raw, store.columns());
        let slot = store.first_available_slot(w, h);
        raw.x = Some(i64::from(slot.x));
        raw.y = Some(i64::from(slot.y));
        raw.w = Some(i64::from(slot.w));
        raw.h = Some(i64::from(slot.h));
        let item = store.add_item(raw);
        debug!(id = %item.id, x = item.rect.x, y = item.rect.y, "item added");
        Some(item)
    }

    /// Add an item at the top-left, pushing every row down to make room.
    /// One notification.
    pub fn insert_at_top(&mut self, mut raw: RawItem) -> Option<Item> {
        let store = self.store.clone()?;
        let (w, h) = requested_span(&raw, store.columns());
        raw.x = Some(0);
        raw.y = Some(0);
        raw.w = Some(i64::from(w));
        raw.h = Some(i64::from(h));
        let item = store.batch(|store| {
            store.shift_all_rows_down(h);
            let item = store.add_item(raw);
            settle(store, Some(&item.id));
            item
        });
        debug!(id = %item.id, "item inserted at top");
        Some(item)
    }

    /// Delete the selected item. Selection clears through the store
    /// notification.
    pub fn delete_selected(&mut self) -> bool {
        let (Some(store), Some(id)) = (self.store.clone(), self.selected()) else {
            return false;
        };
        let removed = store.delete_item(&id);
        if removed {
            debug!(%id, "selected item deleted");
        }
        removed
    }

    // --- Pointer input -----------------------------------------------------

    /// Pointer-down on a tile body (move) or its resize handle (resize).
    pub fn pointer_down(
        &mut self,
        item_id: &ItemId,
        target: PointerTarget,
        sample: PointerSample,
        now: Duration,
    ) -> InteractionEffect {
        self.clock.set(now);
        let Some(request) = self.gesture_request(item_id, target) else {
            return InteractionEffect::noop(InteractionNoopReason::Unavailable);
        };
        if !self.edit_mode() {
            return InteractionEffect::noop(InteractionNoopReason::EditModeDisabled);
        }

        let rect = request.rect;
        let kind = request.kind;
        let effect = self.machine.begin(request, &sample);
        if let InteractionEffect::Started { pointer_id, .. } = &effect {
            debug!(id = %item_id, ?kind, pointer_id, "gesture started");
            self.drag_commit.cancel();
            self.pending_commit = None;
            self.last_committed = Some(rect);
            self.capture(PointerCaptureCommand::Acquire {
                pointer_id: *pointer_id,
            });
            self.set_overlay(Some(InteractionOverlay {
                item_id: item_id.clone(),
                mode: mode_of(kind),
                placement: rect,
                transform: (kind == InteractionKind::Move).then(PixelOffset::default),
            }));
        }
        effect
    }

    /// Pointer-move while a gesture is active.
    pub fn pointer_move(&mut self, sample: PointerSample, now: Duration) -> InteractionEffect {
        self.tick(now);
        let effect = self.machine.update(&sample);
        let InteractionEffect::Preview {
            kind,
            offset,
            candidate,
            ..
        } = &effect
        else {
            return effect;
        };
        let Some(gesture) = self.machine.gesture() else {
            return effect;
        };

        let overlay = match kind {
            InteractionKind::Move => InteractionOverlay {
                item_id: gesture.item_id.clone(),
                mode: InteractionMode::Moving,
                placement: gesture.start,
                transform: Some(*offset),
            },
            InteractionKind::Resize => InteractionOverlay {
                item_id: gesture.item_id.clone(),
                mode: InteractionMode::Resizing,
                placement: *candidate,
                transform: None,
            },
        };
        if *kind == InteractionKind::Move && self.last_committed != Some(*candidate) {
            self.pending_commit = Some(*candidate);
            self.drag_commit.schedule(self.clock.now());
        }
        self.set_overlay(Some(overlay));
        effect
    }

    /// Pointer-up. Commits the gesture, or selects the tile on a click.
    pub fn pointer_up(&mut self, sample: PointerSample, now: Duration) -> InteractionEffect {
        self.clock.set(now);
        let effect = self.machine.finish(&sample);
        self.conclude(&effect);
        effect
    }

    /// Pointer-cancel. Ends the gesture as a release at the last position.
    pub fn pointer_cancel(&mut self, pointer_id: u32, now: Duration) -> InteractionEffect {
        self.clock.set(now);
        let effect = self.machine.cancel(pointer_id);
        self.conclude(&effect);
        effect
    }

    // --- Timers ------------------------------------------------------------

    /// Fire due timers: throttled drag commits and the resize debounce.
    pub fn tick(&mut self, now: Duration) {
        self.clock.set(now);
        let now = self.clock.now();

        if self.drag_commit.poll(now)
            && let Some(candidate) = self.pending_commit.take()
        {
            self.commit_drag(candidate);
        }

        if self.resize.poll(now) {
            self.viewport_dirty = true;
            self.apply_viewport();
        }
    }

    /// Record a viewport width change. Columns follow after the debounce.
    pub fn window_resized(&mut self, viewport_width: f64, now: Duration) {
        self.clock.set(now);
        self.viewport_width = Some(viewport_width);
        self.resize.schedule(self.clock.now());
        trace!(viewport_width, "window resize scheduled");
    }

    // --- Internals ---------------------------------------------------------

    fn gesture_request(&self, item_id: &ItemId, target: PointerTarget) -> Option<GestureRequest> {
        let store = self.store.as_ref()?;
        let render = self.render.as_ref()?.borrow();
        let width = render.surface.container_width()?;
        let container_origin = render.surface.container_origin();
        let metrics = GridMetrics::compute(width, store.columns(), self.config.aspect_ratio)?;
        let rect = store.rect_of(item_id)?;
        let max_row = store.with_items(|items| content_bottom(items, Some(item_id)));
        Some(GestureRequest {
            kind: match target {
                PointerTarget::Body => InteractionKind::Move,
                PointerTarget::ResizeHandle => InteractionKind::Resize,
            },
            item_id: item_id.clone(),
            rect,
            metrics,
            container_origin,
            max_row,
        })
    }

    fn commit_drag(&mut self, candidate: GridRect) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let Some(gesture) = self.machine.gesture() else {
            return;
        };
        if gesture.kind != InteractionKind::Move {
            return;
        }
        let id = gesture.item_id.clone();
        store.batch(|store| {
            store.move_item(&id, PositionPatch::to(candidate.x.into(), candidate.y.into()));
            settle(store, Some(&id));
        });
        self.last_committed = Some(candidate);
        trace!(%id, x = candidate.x, y = candidate.y, "drag candidate committed");
    }

    fn conclude(&mut self, effect: &InteractionEffect) {
        let InteractionEffect::Finished {
            kind,
            item_id,
            pointer_id,
            outcome,
        } = effect
        else {
            return;
        };
        self.drag_commit.cancel();
        self.pending_commit = None;
        self.last_committed = None;
        self.capture(PointerCaptureCommand::Release {
            pointer_id: *pointer_id,
        });
        self.set_overlay(None);

        match outcome {
            GestureOutcome::Commit(rect) => {
                if let Some(store) = self.store.clone() {
                    store.batch(|store| {
                        store.move_item(item_id, PositionPatch::from_rect(*rect));
                        settle(store, Some(item_id));
                    });
                }
                debug!(id = %item_id, ?kind, x = rect.x, y = rect.y, w = rect.w, h = rect.h, "gesture committed");
            }
            GestureOutcome::Click => {
                debug!(id = %item_id, "gesture ended as click");
                self.select_item(Some(item_id));
            }
        }

        if self.viewport_dirty {
            self.apply_viewport();
        }
    }

    fn abandon_gesture(&mut self) {
        if let Some(gesture) = self.machine.force_reset() {
            debug!(id = %gesture.item_id, "gesture abandoned");
            self.drag_commit.cancel();
            self.pending_commit = None;
            self.last_committed = None;
            self.capture(PointerCaptureCommand::Release {
                pointer_id: gesture.pointer_id,
            });
            if let Some(render) = &self.render {
                render.borrow_mut().overlay = None;
            }
        }
    }

    /// Apply the debounced viewport width. Deferred while a gesture is
    /// active so the grid does not change under the pointer.
    fn apply_viewport(&mut self) {
        if self.machine.is_active() {
            return;
        }
        self.viewport_dirty = false;
        let (Some(store), Some(width)) = (self.store.as_ref(), self.viewport_width) else {
            return;
        };
        let columns = self.config.columns_for_width(width);
        if store.set_columns(columns) {
            debug!(viewport_width = width, columns, "grid columns changed");
        }
    }

    fn capture(&self, command: PointerCaptureCommand) {
        if let Some(render) = &self.render {
            render.borrow_mut().surface.pointer_capture(command);
        }
    }

    fn set_overlay(&self, overlay: Option<InteractionOverlay>) {
        if let Some(render) = &self.render {
            render.borrow_mut().overlay = overlay;
        }
        self.rerender();
    }

    fn rerender(&self) {
        let (Some(store), Some(render)) = (&self.store, &self.render) else {
            return;
        };
        let cleared = store.with_items(|items| render.borrow_mut().sync(items));
        if let Some(callback) = cleared {
            callback(None);
        }
    }
}

/// Anchored reflow. If pinning the anchor left an empty row, fall back to a
/// plain reflow so no band survives the commit.
///
/// In that fallback the anchor is packed like every other item and may move
/// away from the position it was dropped on.
fn settle(store: &ItemStore, anchor: Option<&ItemId>) -> usize {
    let mut moved = store.reflow(anchor);
    if anchor.is_some() {
        let gapped = store.with_items(|items| check_layout(items, store.columns()).has_gap());
        if gapped {
            moved += store.reflow(None);
        }
    }
    moved
}

fn requested_span(raw: &RawItem, columns: u32) -> (u32, u32) {
    let (default_w, default_h) = raw.item_type().default_span();
    let span = |value: Option<i64>, default: u32| {
        value
            .filter(|v| *v > 0)
            .map_or(default, |v| u32::try_from(v).unwrap_or(u32::MAX))
    };
    (
        span(raw.w, default_w).min(columns.max(1)),
        span(raw.h, default_h).min(MAX_ITEM_ROWS),
    )
}

const fn mode_of(kind: InteractionKind) -> InteractionMode {
    match kind {
        InteractionKind::Move => InteractionMode::Moving,
        InteractionKind::Resize => InteractionMode::Resizing,
    }
}
