// Pairwise scan vs necklace bucketing over catalogs of increasing size.
//
// The catalog is deterministic: every whole-row rotation and every
// hexachord recombination of a handful of seed rows, plus their inversions.
// The pairwise scan grows with the square of the class count; bucketing
// stays close to linear. The `_families` variants compare whole P/I/R/RI
// families the way the catalog pass does.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tone_row_analysis::hexachord::hexachord_rotations;
use tone_row_analysis::rotation::{RotationDetector, RotationStrategy, row_rotations};
use tone_row_analysis::{IntervalVector, Modulus};

const SEEDS: [&str; 6] = [
    "2_8_11_7_2_1_8_8_6_3_5",
    "1_3_1_6_11_5_4_2_9_2_6",
    "1_2_3_4_5_6_7_8_9_10_11",
    "11_3_11_3_11_3_11_3_11_3_11",
    "4_11_3_1_8_3_10_4_10_11_2",
    "5_5_5_5_5_5_5_5_5_5_5",
];

fn catalog() -> Vec<IntervalVector> {
    let mut classes = Vec::new();
    for seed in SEEDS {
        let Ok(vector) = IntervalVector::parse(seed, Modulus::TWELVE) else {
            continue;
        };
        let Ok(rotations) = row_rotations(&vector) else {
            continue;
        };
        for rotation in rotations {
            classes.push(rotation.row_class.negate());
            if let Ok(hexachords) = hexachord_rotations(&rotation.row) {
                classes.extend(hexachords.into_iter().map(|h| h.row_class));
            }
            classes.push(rotation.row_class);
        }
    }
    classes
}

fn bench_rotation_scan(c: &mut Criterion) {
    let all = catalog();
    let mut group = c.benchmark_group("rotation_scan");
    for size in [50usize, 200, all.len()] {
        let classes = &all[..size.min(all.len())];
        for (name, detector) in [
            ("pairwise", RotationDetector::with_strategy(RotationStrategy::PairwiseScan)),
            ("pairwise_parallel", RotationDetector::with_strategy(RotationStrategy::PairwiseScan).parallel(true)),
            ("necklace", RotationDetector::with_strategy(RotationStrategy::NecklaceBucket)),
        ] {
            group.bench_with_input(BenchmarkId::new(name, classes.len()), classes, |b, classes| {
                b.iter(|| black_box(detector.detect(classes).relations.len()))
            });
            let family_name = format!("{name}_families");
            group.bench_with_input(BenchmarkId::new(family_name, classes.len()), classes, |b, classes| {
                b.iter(|| black_box(detector.detect_classes(classes).relations.len()))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_rotation_scan);
criterion_main!(benches);
