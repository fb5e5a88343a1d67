//! Benchmarks for the WSOLA seam search.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tarsos_dsp::dsp::correlation::{best_overlap_offset, weight_reference};

use crate::noise;

pub fn bench_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/correlation");

    // Overlap and seek lengths of the speech, music and slowdown presets at 44.1kHz
    for &(name, overlap, seek) in &[("speech", 529, 662), ("music", 529, 1235), ("slowdown", 882, 1544)] {
        let carry = noise(overlap, 1);
        let input = noise(seek + overlap, 2);
        let mut reference = vec![0.0f32; overlap];

        group.bench_with_input(BenchmarkId::new("search", name), &seek, |b, &seek| {
            b.iter(|| {
                weight_reference(&carry, &mut reference, overlap);
                best_overlap_offset(black_box(&reference), black_box(&input), seek)
            })
        });
    }

    group.finish();
}
