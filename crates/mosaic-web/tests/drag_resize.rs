//! Pointer gestures end to end: engine, store, and recording surface.
//!
//! The grid is 10 columns over a 1000px container, so columns are 100px wide
//! and rows are 133.3px tall at the default 4:3 aspect ratio.

use std::time::Duration;

use mosaic_core::{PointerSample, PointerTarget};
use mosaic_layout::{GridRect, ItemId, ItemType, LayoutPayload, RawItem, check_layout};
use mosaic_runtime::{GridConfig, ItemStore};
use mosaic_web::{
    GestureOutcome, GridEngine, GridEngineOptions, GridPlacement, InteractionEffect,
    InteractionMode, InteractionNoopReason, PointerCaptureCommand, RecordingSurface,
};
use pretty_assertions::assert_eq;

const ROW: f64 = 100.0 * 4.0 / 3.0;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn id(s: &str) -> ItemId {
    ItemId::from(s)
}

/// Center of cell `(col, row)` in client coordinates.
fn cell(col: u32, row: u32) -> PointerSample {
    PointerSample::primary(
        1,
        f64::from(col) * 100.0 + 50.0,
        f64::from(row) * ROW + ROW / 2.0,
    )
}

fn setup(items: Vec<RawItem>) -> (ItemStore, GridEngine<RecordingSurface>) {
    let store = ItemStore::new(10);
    store.load_state(Some(LayoutPayload { items }));
    let engine = GridEngine::new(
        GridEngineOptions::new(store.clone(), RecordingSurface::new(1000.0)).edit_mode(true),
    )
    .expect("engine");
    (store, engine)
}

fn two_units() -> (ItemStore, GridEngine<RecordingSurface>) {
    setup(vec![RawItem::sized("a", 1, 1), RawItem::sized("b", 1, 1)])
}

fn rect(store: &ItemStore, s: &str) -> GridRect {
    store
        .rect_of(&id(s))
        .unwrap_or_else(|| panic!("missing item {s}"))
}

fn assert_packed(store: &ItemStore) {
    let report = store.with_items(|items| check_layout(items, store.columns()));
    assert!(report.is_packed(), "{report:?}");
}

#[test]
fn dropping_onto_an_occupied_cell_leaves_no_overlap() {
    let (store, mut engine) = two_units();
    assert_eq!(rect(&store, "a"), GridRect::new(0, 0, 1, 1));
    assert_eq!(rect(&store, "b"), GridRect::new(1, 0, 1, 1));

    let started = engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0));
    assert!(matches!(started, InteractionEffect::Started { .. }));
    engine.pointer_move(cell(1, 0), ms(10));
    let before = store.notification_count();
    let ended = engine.pointer_up(cell(1, 0), ms(20));

    assert!(matches!(
        ended,
        InteractionEffect::Finished {
            outcome: GestureOutcome::Commit(_),
            ..
        }
    ));
    assert_eq!(store.notification_count(), before + 1);
    assert_eq!(rect(&store, "a"), GridRect::new(1, 0, 1, 1));
    assert_eq!(rect(&store, "b"), GridRect::new(0, 0, 1, 1));
    assert_packed(&store);
    assert_eq!(
        engine.with_surface(|s| s.captures().to_vec()),
        Some(vec![
            PointerCaptureCommand::Acquire { pointer_id: 1 },
            PointerCaptureCommand::Release { pointer_id: 1 },
        ])
    );
}

#[test]
fn drag_commits_are_throttled_and_latest_candidate_wins() {
    let (store, mut engine) = two_units();
    engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0));
    let before = store.notification_count();

    engine.pointer_move(cell(2, 0), ms(10));
    engine.pointer_move(cell(3, 0), ms(30));
    engine.pointer_move(cell(4, 0), ms(50));
    assert_eq!(store.notification_count(), before);
    assert_eq!(rect(&store, "a"), GridRect::new(0, 0, 1, 1));

    engine.tick(ms(89));
    assert_eq!(store.notification_count(), before);
    engine.tick(ms(90));
    assert_eq!(store.notification_count(), before + 1);
    assert_eq!(rect(&store, "a"), GridRect::new(4, 0, 1, 1));
    assert_eq!(rect(&store, "b"), GridRect::new(0, 0, 1, 1));

    // Same cell again: nothing new to commit.
    engine.pointer_move(cell(4, 0), ms(200));
    engine.tick(ms(400));
    assert_eq!(store.notification_count(), before + 1);
}

#[test]
fn dragged_tile_keeps_frozen_placement_with_transform() {
    let (_store, mut engine) = two_units();
    engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0));
    engine.pointer_move(cell(3, 0), ms(10));
    engine.tick(ms(100));

    let tile = engine
        .with_surface(|s| s.tile(&id("a")).cloned())
        .flatten()
        .expect("tile a");
    assert_eq!(tile.placement.column_start, 1);
    assert_eq!(tile.interaction, Some(InteractionMode::Moving));
    assert!(tile.elevated);
    assert_eq!(tile.transform.map(|t| t.dx), Some(300.0));

    engine.pointer_up(cell(3, 0), ms(120));
    let tile = engine
        .with_surface(|s| s.tile(&id("a")).cloned())
        .flatten()
        .expect("tile a");
    assert_eq!(tile.placement.column_start, 4);
    assert_eq!(tile.interaction, None);
    assert!(!tile.elevated);
    assert_eq!(tile.transform, None);
}

#[test]
fn resize_previews_without_store_writes_then_commits_once() {
    let (store, mut engine) = two_units();
    let before = store.notification_count();
    engine.pointer_down(&id("b"), PointerTarget::ResizeHandle, cell(1, 0), ms(0));
    engine.pointer_move(
        PointerSample::primary(1, 350.0, ROW / 2.0 + ROW),
        ms(10),
    );
    engine.tick(ms(500));

    assert_eq!(store.notification_count(), before);
    assert_eq!(rect(&store, "b"), GridRect::new(1, 0, 1, 1));
    let placement = engine
        .with_surface(|s| s.tile(&id("b")).map(|t| t.placement))
        .flatten();
    assert_eq!(
        placement,
        Some(GridPlacement {
            column_start: 2,
            column_span: 3,
            row_start: 1,
            row_span: 2
        })
    );

    engine.pointer_up(PointerSample::primary(1, 350.0, ROW / 2.0 + ROW), ms(600));
    assert_eq!(store.notification_count(), before + 1);
    assert_eq!(rect(&store, "b"), GridRect::new(1, 0, 3, 2));
    assert_eq!(rect(&store, "a"), GridRect::new(0, 0, 1, 1));
    assert_packed(&store);
}

#[test]
fn release_without_movement_selects_the_tile() {
    let (store, mut engine) = two_units();
    let before = store.version();
    engine.pointer_down(&id("b"), PointerTarget::Body, cell(1, 0), ms(0));
    let ended = engine.pointer_up(cell(1, 0), ms(50));
    assert!(matches!(
        ended,
        InteractionEffect::Finished {
            outcome: GestureOutcome::Click,
            ..
        }
    ));
    assert_eq!(store.version(), before);
    assert_eq!(engine.selected(), Some(id("b")));
    let selected = engine
        .with_surface(|s| s.tile(&id("b")).map(|t| t.selected))
        .flatten();
    assert_eq!(selected, Some(true));
}

#[test]
fn cancel_after_movement_commits_like_release() {
    let (store, mut engine) = two_units();
    engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0));
    engine.pointer_move(cell(5, 0), ms(10));
    engine.pointer_cancel(1, ms(20));
    assert_eq!(rect(&store, "a"), GridRect::new(5, 0, 1, 1));
    assert!(engine.interaction_state().gesture().is_none());
}

#[test]
fn dragging_below_content_stops_at_the_last_row() {
    let (store, mut engine) = two_units();
    engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0));
    engine.pointer_up(cell(0, 6), ms(30));
    // The other tiles end at row 1, so that is as low as a can land.
    assert_packed(&store);
    assert_eq!(rect(&store, "a"), GridRect::new(0, 1, 1, 1));
    assert_eq!(rect(&store, "b"), GridRect::new(0, 0, 1, 1));
}

#[test]
fn malformed_and_foreign_pointer_events_are_ignored() {
    let (store, mut engine) = two_units();
    let before = store.version();
    assert_eq!(
        engine.pointer_move(cell(3, 3), ms(0)),
        InteractionEffect::noop(InteractionNoopReason::Idle)
    );
    assert_eq!(
        engine.pointer_down(
            &id("a"),
            PointerTarget::Body,
            PointerSample::without_position(1),
            ms(0)
        ),
        InteractionEffect::noop(InteractionNoopReason::MissingCoordinates)
    );
    assert_eq!(
        engine.pointer_down(&id("zzz"), PointerTarget::Body, cell(0, 0), ms(0)),
        InteractionEffect::noop(InteractionNoopReason::Unavailable)
    );
    engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0));
    assert_eq!(
        engine.pointer_move(PointerSample::primary(7, 500.0, 10.0), ms(10)),
        InteractionEffect::noop(InteractionNoopReason::PointerMismatch)
    );
    assert_eq!(store.version(), before);
}

#[test]
fn gestures_require_edit_mode() {
    let (_store, mut engine) = two_units();
    engine.set_edit_mode(false);
    assert_eq!(
        engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0)),
        InteractionEffect::noop(InteractionNoopReason::EditModeDisabled)
    );
}

#[test]
fn leaving_edit_mode_abandons_the_gesture_and_releases_capture() {
    let (store, mut engine) = two_units();
    engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0));
    engine.pointer_move(cell(4, 0), ms(10));
    engine.set_edit_mode(false);
    engine.tick(ms(500));
    assert_eq!(rect(&store, "a"), GridRect::new(0, 0, 1, 1));
    let captures = engine.with_surface(|s| s.captures().len());
    assert_eq!(captures, Some(2));
    let editable = engine.with_surface(|s| s.tiles().iter().any(|t| t.editable));
    assert_eq!(editable, Some(false));
}

#[test]
fn missing_container_disables_gestures() {
    let store = ItemStore::new(10);
    store.load_state(Some(LayoutPayload {
        items: vec![RawItem::sized("a", 1, 1)],
    }));
    let mut engine = GridEngine::new(
        GridEngineOptions::new(store.clone(), RecordingSurface::detached()).edit_mode(true),
    )
    .expect("engine");
    assert_eq!(
        engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0)),
        InteractionEffect::noop(InteractionNoopReason::Unavailable)
    );
    assert_eq!(engine.metrics(), None);
    assert_eq!(engine.with_surface(|s| s.apply_count()), Some(0));
    assert_eq!(engine.with_surface(|s| s.captures().len()), Some(0));
}

#[test]
fn missing_store_makes_everything_a_noop() {
    let mut engine = GridEngine::new(GridEngineOptions {
        store: None,
        surface: Some(RecordingSurface::new(1000.0)),
        config: GridConfig::default(),
        viewport_width: None,
        edit_mode: true,
    })
    .expect("engine");
    assert!(!engine.is_attached());
    assert_eq!(engine.reflow_grid(None), 0);
    assert_eq!(engine.compact_grid(None), 0);
    assert_eq!(engine.add_item(RawItem::default()), None);
    assert_eq!(engine.first_available_slot(1, 1), None);
    assert_eq!(engine.layout_report(), None);
    assert!(!engine.delete_selected());
    assert_eq!(
        engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0)),
        InteractionEffect::noop(InteractionNoopReason::Unavailable)
    );
}

#[test]
fn window_resize_is_debounced_before_columns_change() {
    let (store, mut engine) = setup((0..6).map(|i| RawItem::sized(&format!("t{i}"), 1, 1)).collect());
    engine.window_resized(800.0, ms(0));
    engine.window_resized(500.0, ms(60));
    engine.tick(ms(120));
    assert_eq!(store.columns(), 10);
    engine.tick(ms(160));
    assert_eq!(store.columns(), 2);
    assert_packed(&store);
    assert_eq!(store.with_items(|items| check_layout(items, 2)).bottom, 3);
}

#[test]
fn column_change_waits_for_active_gesture() {
    let (store, mut engine) = two_units();
    engine.pointer_down(&id("a"), PointerTarget::Body, cell(0, 0), ms(0));
    engine.window_resized(500.0, ms(0));
    engine.tick(ms(200));
    assert_eq!(store.columns(), 10);
    engine.pointer_up(cell(0, 0), ms(210));
    assert_eq!(store.columns(), 2);
}

#[test]
fn add_and_insert_place_without_overlap() {
    let (store, mut engine) = two_units();
    let added = engine
        .add_item(RawItem::placed("c", ItemType::Image, 0, 0, 2, 1))
        .expect("added");
    assert_eq!(added.rect, GridRect::new(2, 0, 2, 1));

    let before = store.notification_count();
    let text = RawItem {
        id: Some("note".into()),
        kind: Some("text".into()),
        ..RawItem::default()
    };
    let inserted = engine.insert_at_top(text).expect("inserted");
    assert_eq!(store.notification_count(), before + 1);
    assert_eq!(rect(&store, inserted.id.as_str()), GridRect::new(0, 0, 2, 1));
    assert_packed(&store);
}
