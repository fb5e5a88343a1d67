//! Benchmarks for low-level DSP primitives.

mod converter;
mod correlation;
mod crossfade;

pub use converter::bench_converter;
pub use correlation::bench_correlation;
pub use crossfade::bench_crossfade;
