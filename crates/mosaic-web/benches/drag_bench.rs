//! Benchmarks for keyed rendering and a full drag gesture.
//!
//! Run with: cargo bench -p mosaic-web

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mosaic_core::{PointerSample, PointerTarget};
use mosaic_layout::{ItemId, LayoutPayload, PositionPatch, RawItem};
use mosaic_runtime::ItemStore;
use mosaic_web::{
    GridEngine, GridEngineOptions, RecordingSurface, RenderContext, diff_views, render_view,
};
use std::hint::black_box;

fn make_store(n: usize) -> ItemStore {
    let items = (0..n)
        .map(|i| RawItem::sized(&format!("item-{i}"), (i % 3) as i64 + 1, (i % 2) as i64 + 1))
        .collect();
    let store = ItemStore::new(10);
    store.load_state(Some(LayoutPayload { items }));
    store
}

fn bench_render_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("view/render_diff");
    for n in [10, 100, 300] {
        let store = make_store(n);
        let items = store.get_items();
        let prev = render_view(&items, &RenderContext::default());
        store.move_item(&ItemId::from("item-0"), PositionPatch::to(7, 3));
        store.reflow(Some(&ItemId::from("item-0")));
        let moved = store.get_items();
        group.bench_with_input(BenchmarkId::from_parameter(n), &moved, |b, moved| {
            b.iter(|| {
                let next = render_view(moved, &RenderContext::default());
                black_box(diff_views(&prev, &next))
            })
        });
    }
    group.finish();
}

fn bench_drag_gesture(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/drag_gesture");
    for n in [10, 100, 300] {
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter_batched(
                || {
                    GridEngine::new(
                        GridEngineOptions::new(make_store(n), RecordingSurface::new(1000.0))
                            .edit_mode(true),
                    )
                    .expect("engine")
                },
                |mut engine| {
                    let id = ItemId::from("item-0");
                    let mut now = Duration::ZERO;
                    engine.pointer_down(
                        &id,
                        PointerTarget::Body,
                        PointerSample::primary(1, 50.0, 50.0),
                        now,
                    );
                    for step in 1..=20u32 {
                        now += Duration::from_millis(16);
                        let x = 50.0 + f64::from(step) * 35.0;
                        let y = 50.0 + f64::from(step) * 20.0;
                        engine.pointer_move(PointerSample::primary(1, x, y), now);
                    }
                    black_box(engine.pointer_up(PointerSample::primary(1, 750.0, 450.0), now))
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render_diff, bench_drag_gesture);
criterion_main!(benches);
