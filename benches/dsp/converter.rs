//! Benchmarks for PCM decoding and encoding.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tarsos_dsp::io::{AudioFormat, ByteOrder, Encoding, SampleConverter};

use crate::{noise, WINDOW_SIZES};

pub fn bench_converter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/converter");
    let formats = [
        ("pcm16le", AudioFormat::pcm16(44_100.0, 1)),
        (
            "pcm24be",
            AudioFormat::new(44_100.0, 24, 1, Encoding::SignedInt, ByteOrder::BigEndian),
        ),
        ("float32", AudioFormat::float32(44_100.0, 1)),
    ];

    for (name, format) in formats {
        let Ok(format) = format else { continue };
        let converter = SampleConverter::new(&format);

        for &size in WINDOW_SIZES {
            let samples = noise(size, 5);
            let mut bytes = vec![0u8; size * format.bytes_per_sample()];
            converter.to_bytes(&samples, &mut bytes);
            let mut decoded = vec![0.0f32; size];

            group.bench_with_input(
                BenchmarkId::new(format!("decode/{name}"), size),
                &size,
                |b, _| b.iter(|| converter.to_floats(black_box(&bytes), black_box(&mut decoded))),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("encode/{name}"), size),
                &size,
                |b, _| b.iter(|| converter.to_bytes(black_box(&samples), black_box(&mut bytes))),
            );
        }
    }

    group.finish();
}
