//! Streaming scenario benchmarks.
//!
//! These push whole in-memory streams through a dispatcher, measuring the
//! read/convert/slide loop on its own and with WSOLA in the chain.

mod dispatch;
mod wsola;

pub use dispatch::bench_dispatch;
pub use wsola::bench_wsola;
