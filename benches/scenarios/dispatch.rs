//! Benchmarks for the dispatch loop with a light analysis chain.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tarsos_dsp::{
    processors::{SilenceDetector, ZeroCrossingRate},
    AudioFormat, Dispatcher, MemorySource, DEFAULT_OVERLAP, DEFAULT_WINDOW_SIZE,
};

use crate::noise;

pub fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/dispatch");
    let Ok(format) = AudioFormat::pcm16(44_100.0, 1) else {
        return;
    };
    // One second of audio per iteration
    let samples = noise(44_100, 6);

    for &(window, overlap) in &[(DEFAULT_WINDOW_SIZE, 0), (DEFAULT_WINDOW_SIZE, DEFAULT_OVERLAP), (2048, 1536)] {
        let id = format!("{window}/{overlap}");
        group.bench_with_input(BenchmarkId::new("analysis", id), &window, |b, _| {
            b.iter(|| {
                let source = MemorySource::from_floats(&samples, format);
                let Ok(mut dispatcher) = Dispatcher::new(source, window, overlap) else {
                    return;
                };
                dispatcher.add_processor(SilenceDetector::default());
                dispatcher.add_processor(ZeroCrossingRate::new());
                black_box(dispatcher.run().is_ok());
            })
        });
    }

    group.finish();
}
