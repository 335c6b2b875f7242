// Dedup of row-form-sized bags: 48 twelve-element rows with a controllable
// share of repeats, the shape produced by expanding a degenerate interval
// pattern. Compares the hashbrown-backed helper with an FxHashSet baseline.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rustc_hash::FxHashSet;
use std::hint::black_box;
use tone_row_utils::dedup_in_order;

fn bag(distinct: usize) -> Vec<Vec<u32>> {
    (0..48)
        .map(|i| {
            let t = (i % distinct) as u32;
            (0..12u32).map(|p| (p * 7 + t) % 12).collect()
        })
        .collect()
}

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_48_forms");
    for distinct in [1usize, 12, 48] {
        let rows = bag(distinct);
        group.bench_with_input(BenchmarkId::new("hashbrown", distinct), &rows, |b, rows| {
            b.iter(|| black_box(dedup_in_order(rows).len()))
        });
        group.bench_with_input(BenchmarkId::new("fx_set", distinct), &rows, |b, rows| {
            b.iter(|| {
                let set: FxHashSet<&Vec<u32>> = rows.iter().collect();
                black_box(set.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dedup);
criterion_main!(benches);
