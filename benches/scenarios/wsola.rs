//! Benchmarks for WSOLA over a whole stream.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tarsos_dsp::{processors::Wsola, AudioFormat, Dispatcher, MemorySource, WsolaParams};

use crate::noise;

pub fn bench_wsola(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/wsola");
    group.sample_size(20);
    let Ok(format) = AudioFormat::float32(44_100.0, 1) else {
        return;
    };
    // One second of audio per iteration
    let samples = noise(44_100, 7);

    for &tempo in &[0.5, 1.0, 2.0] {
        for (preset, params) in [
            ("speech", WsolaParams::speech(tempo, 44_100.0)),
            ("music", WsolaParams::music(tempo, 44_100.0)),
        ] {
            group.bench_with_input(BenchmarkId::new(preset, tempo), &tempo, |b, _| {
                b.iter(|| {
                    let Ok(wsola) = Wsola::new(params) else {
                        return;
                    };
                    let source = MemorySource::from_floats(&samples, format);
                    let Ok(mut dispatcher) =
                        Dispatcher::new(source, wsola.input_buffer_size(), wsola.overlap())
                    else {
                        return;
                    };
                    dispatcher.add_processor(wsola);
                    black_box(dispatcher.run().is_ok());
                })
            });
        }
    }

    group.finish();
}
