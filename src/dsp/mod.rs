//! Low-level DSP primitives used by the processors.
//!
//! These are plain functions and small state structs over `&[f32]` slices.
//! They never allocate per call, so processors can run them once per window
//! without touching the allocator.

/// Cross-correlation seam search.
pub mod correlation;
/// Linear overlap crossfade.
pub mod crossfade;
/// RMS, dB and silence detection.
pub mod level;
/// WSOLA parameters and the splicer itself.
pub mod wsola;

pub use wsola::{WsolaLengths, WsolaParams, WsolaStretcher};
