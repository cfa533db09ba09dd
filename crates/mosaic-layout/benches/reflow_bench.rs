//! Benchmarks for reflow and first-fit packing.
//!
//! Run with: cargo bench -p mosaic-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mosaic_layout::{
    IdAllocator, Item, ItemId, RawItem, compact, first_available_slot, normalize_all, reflow,
};
use std::hint::black_box;

/// Deterministic mixed-size layout with `n` items scattered over a
/// `columns`-wide grid.
fn make_layout(n: usize, columns: u32) -> Vec<Item> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move |bound: u64| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((state >> 33) % bound) as i64
    };
    let raws = (0..n)
        .map(|i| RawItem {
            x: Some(next(u64::from(columns))),
            y: Some(next(n as u64 / 2 + 1)),
            ..RawItem::sized(&format!("item-{i}"), next(3) + 1, next(2) + 1)
        })
        .collect();
    normalize_all(raws, columns, &mut IdAllocator::new())
}

fn bench_reflow(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/reflow");
    for n in [10, 50, 100, 300] {
        let items = make_layout(n, 10);
        group.bench_with_input(BenchmarkId::new("unanchored", n), &items, |b, items| {
            b.iter(|| black_box(reflow(items, 10, None)))
        });
        let anchor = ItemId::from("item-0");
        group.bench_with_input(BenchmarkId::new("anchored", n), &items, |b, items| {
            b.iter(|| black_box(reflow(items, 10, Some(&anchor))))
        });
    }
    group.finish();
}

fn bench_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/compact");
    for n in [10, 100, 300] {
        let items = make_layout(n, 10);
        group.bench_with_input(BenchmarkId::from_parameter(n), &items, |b, items| {
            b.iter(|| black_box(compact(items, 10, None)))
        });
    }
    group.finish();
}

fn bench_first_available_slot(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/first_available_slot");
    for n in [10, 100, 300] {
        let items = make_layout(n, 10);
        group.bench_with_input(BenchmarkId::from_parameter(n), &items, |b, items| {
            b.iter(|| black_box(first_available_slot(items, 10, 2, 2)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_reflow,
    bench_compact,
    bench_first_available_slot
);
criterion_main!(benches);
