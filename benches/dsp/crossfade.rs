//! Benchmarks for the linear overlap crossfade.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tarsos_dsp::dsp::crossfade::overlap_add;

use crate::{noise, WINDOW_SIZES};

pub fn bench_crossfade(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/crossfade");

    for &size in WINDOW_SIZES {
        let old = noise(size, 3);
        let new = noise(size, 4);
        let mut out = vec![0.0f32; size];

        group.bench_with_input(BenchmarkId::new("overlap_add", size), &size, |b, _| {
            b.iter(|| overlap_add(black_box(&mut out), black_box(&old), black_box(&new)))
        });
    }

    group.finish();
}
