//! WSOLA - Waveform Similarity based Overlap-Add time stretching.

/*
Time Stretching with WSOLA
==========================

Playing audio faster by simply reading it faster raises the pitch (the
"chipmunk" effect). WSOLA changes the duration but not the pitch: it cuts the
input into short segments, drops or repeats material between them, and glues
the segments back together with short crossfades.

Vocabulary
----------

  tempo         Speed ratio. 1.0 = unchanged, 2.0 = twice as fast (half the
                duration), 0.5 = half speed (double the duration).

  sequence      One segment copied from the input to the output. Its length
                is `seek_window` samples (the "sequence" milliseconds).

  overlap       Length of the crossfade between consecutive sequences.

  seek          Length of the range searched for the best splice position.

  skip          How far the input advances per output sequence:
                  skip = round(tempo × (seek_window - overlap))


One Iteration
-------------

The input window is `input_size` samples long:

    input_size = max(skip + overlap, seek_window) + seek

    input  ├────────────────────────────────────────────────┤
           │◀── τ ──▶│◀──────────── seek_window ──────────▶│
           0     best offset
                     ├ overlap ┤├── sequence ──┤├ overlap ┤
                      crossfade     copied       carried to
                      with carry    verbatim     next window

    output ├ overlap ┤├── sequence ──┤
           ◀──── seek_window - overlap ────▶

1. Search τ in [0, seek) for the position where the input best matches the
   carried-over tail of the previous sequence (see `correlation`).
2. Crossfade the carry with input[τ..τ + overlap].
3. Copy the next seek_window - 2 × overlap samples verbatim.
4. Save the following `overlap` samples as the new carry.

Every iteration consumes `skip` input samples and produces
`seek_window - overlap` output samples, so the duration ratio is exactly
1 / tempo apart from rounding.


Parameter Presets
-----------------

  speech     40 ms sequence, 15 ms seek, 12 ms overlap
  music      82 ms sequence, 28 ms seek, 12 ms overlap
  slowdown  100 ms sequence, 35 ms seek, 20 ms overlap
  automatic  sequence and seek interpolated from the tempo

Longer sequences suit music (fewer splices, fewer artifacts on sustained
notes). Shorter sequences follow speech better (less echo on fast syllables).
*/

use crate::{
    dsp::{correlation, crossfade},
    error::{Error, Result},
};

/// The carry and reference buffers are allocated this many times larger than
/// the first overlap, so later overlap changes rarely reallocate.
pub const OVERLAP_HEADROOM: usize = 8;

/// Tempo and segment lengths for WSOLA, before conversion to samples.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WsolaParams {
    pub tempo: f64,
    pub sample_rate: f64,
    pub sequence_ms: f64,
    pub seek_window_ms: f64,
    pub overlap_ms: f64,
}

impl WsolaParams {
    pub fn new(
        tempo: f64,
        sample_rate: f64,
        sequence_ms: f64,
        seek_window_ms: f64,
        overlap_ms: f64,
    ) -> Self {
        Self {
            tempo,
            sample_rate,
            sequence_ms,
            seek_window_ms,
            overlap_ms,
        }
    }

    pub fn speech(tempo: f64, sample_rate: f64) -> Self {
        Self::new(tempo, sample_rate, 40.0, 15.0, 12.0)
    }

    pub fn music(tempo: f64, sample_rate: f64) -> Self {
        Self::new(tempo, sample_rate, 82.0, 28.0, 12.0)
    }

    pub fn slowdown(tempo: f64, sample_rate: f64) -> Self {
        Self::new(tempo, sample_rate, 100.0, 35.0, 20.0)
    }

    /// Sequence and seek lengths interpolated linearly from the tempo.
    ///
    /// Tempo 0.5 uses 125 ms sequences and a 25 ms seek; tempo 2.0 uses
    /// 50 ms and 15 ms. Tempos outside that range use the nearest end.
    pub fn automatic(tempo: f64, sample_rate: f64) -> Self {
        const TEMPO_LOW: f64 = 0.5;
        const TEMPO_HIGH: f64 = 2.0;
        const SEQUENCE_LOW: f64 = 125.0;
        const SEQUENCE_HIGH: f64 = 50.0;
        const SEEK_LOW: f64 = 25.0;
        const SEEK_HIGH: f64 = 15.0;

        let t = tempo.clamp(TEMPO_LOW, TEMPO_HIGH);
        let lerp = |low: f64, high: f64| {
            let k = (high - low) / (TEMPO_HIGH - TEMPO_LOW);
            (low + k * (t - TEMPO_LOW)).round()
        };

        Self::new(
            tempo,
            sample_rate,
            lerp(SEQUENCE_LOW, SEQUENCE_HIGH),
            lerp(SEEK_LOW, SEEK_HIGH),
            12.0,
        )
    }

    /// Same segment lengths at a different tempo.
    pub fn with_tempo(mut self, tempo: f64) -> Self {
        self.tempo = tempo;
        self
    }
}

/// Segment lengths in samples, derived from [`WsolaParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsolaLengths {
    pub overlap: usize,
    pub seek_window: usize,
    pub seek: usize,
    pub skip: usize,
}

impl WsolaLengths {
    pub fn from_params(params: &WsolaParams) -> Result<Self> {
        if !(params.tempo.is_finite() && params.tempo > 0.0) {
            return Err(Error::InvalidParameters(format!(
                "tempo must be positive, got {}",
                params.tempo
            )));
        }
        if !(params.sample_rate.is_finite() && params.sample_rate > 0.0) {
            return Err(Error::InvalidParameters(format!(
                "sample rate must be positive, got {}",
                params.sample_rate
            )));
        }

        let to_samples = |ms: f64| (params.sample_rate * ms / 1000.0).round().max(0.0) as usize;
        let overlap = to_samples(params.overlap_ms);
        let seek_window = to_samples(params.sequence_ms);
        let seek = to_samples(params.seek_window_ms);

        if overlap == 0 || seek == 0 {
            return Err(Error::InvalidParameters(format!(
                "overlap ({overlap}) and seek ({seek}) must be at least one sample"
            )));
        }
        if seek_window < 2 * overlap {
            return Err(Error::InvalidParameters(format!(
                "sequence ({seek_window} samples) must be at least twice the overlap ({overlap})"
            )));
        }

        let skip = (params.tempo * (seek_window - overlap) as f64).round() as usize;
        if skip == 0 {
            return Err(Error::InvalidParameters(format!(
                "tempo {} is too slow for a {seek_window} sample sequence",
                params.tempo
            )));
        }

        Ok(Self {
            overlap,
            seek_window,
            seek,
            skip,
        })
    }

    /// Samples each input window must hold.
    pub fn input_size(&self) -> usize {
        (self.skip + self.overlap).max(self.seek_window) + self.seek
    }

    /// Samples produced per window.
    pub fn output_size(&self) -> usize {
        self.seek_window - self.overlap
    }

    /// Overlap to request from the dispatcher so that it advances by `skip`.
    pub fn input_overlap(&self) -> usize {
        self.input_size() - self.skip
    }
}

/// Stateful WSOLA splicer for a mono signal.
pub struct WsolaStretcher {
    params: WsolaParams,
    lengths: WsolaLengths,
    carry: Vec<f32>,
    reference: Vec<f32>,
}

impl WsolaStretcher {
    pub fn new(params: WsolaParams) -> Result<Self> {
        let lengths = WsolaLengths::from_params(&params)?;
        let capacity = lengths.overlap * OVERLAP_HEADROOM;

        Ok(Self {
            params,
            lengths,
            carry: vec![0.0; capacity],
            reference: vec![0.0; capacity],
        })
    }

    /// Switch to new parameters. The carry is kept so the next splice stays
    /// smooth; the buffers only grow when the overlap outgrows the headroom.
    pub fn configure(&mut self, params: WsolaParams) -> Result<()> {
        let lengths = WsolaLengths::from_params(&params)?;
        if lengths.overlap > self.carry.len() {
            self.carry.resize(lengths.overlap, 0.0);
            self.reference.resize(lengths.overlap, 0.0);
        }
        self.params = params;
        self.lengths = lengths;
        Ok(())
    }

    pub fn params(&self) -> &WsolaParams {
        &self.params
    }

    pub fn lengths(&self) -> &WsolaLengths {
        &self.lengths
    }

    pub fn tempo(&self) -> f64 {
        self.params.tempo
    }

    /// Capacity of the carry buffer in samples.
    pub fn carry_capacity(&self) -> usize {
        self.carry.len()
    }

    /// Splice one window. `input` must hold `input_size()` samples and
    /// `output` exactly `output_size()`. Returns the chosen offset.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> usize {
        let WsolaLengths {
            overlap,
            seek_window,
            seek,
            ..
        } = self.lengths;
        debug_assert!(input.len() >= self.lengths.input_size());
        debug_assert_eq!(output.len(), self.lengths.output_size());

        correlation::weight_reference(&self.carry, &mut self.reference, overlap);
        let offset = correlation::best_overlap_offset(&self.reference[..overlap], input, seek);

        let (head, body) = output.split_at_mut(overlap);
        crossfade::overlap_add(head, &self.carry[..overlap], &input[offset..offset + overlap]);

        let sequence = seek_window - 2 * overlap;
        let body_start = offset + overlap;
        body[..sequence].copy_from_slice(&input[body_start..body_start + sequence]);

        let carry_start = body_start + sequence;
        self.carry[..overlap].copy_from_slice(&input[carry_start..carry_start + overlap]);

        offset
    }

    /// Forget the carried-over samples.
    pub fn reset(&mut self) {
        self.carry.fill(0.0);
        self.reference.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn music_preset_lengths_at_44k1() {
        let lengths = WsolaLengths::from_params(&WsolaParams::music(1.0, 44_100.0)).unwrap();

        assert_eq!(lengths.overlap, 529);
        assert_eq!(lengths.seek_window, 3616);
        assert_eq!(lengths.seek, 1235);
        assert_eq!(lengths.skip, 3087);
        assert_eq!(lengths.input_size(), 3616 + 1235);
        assert_eq!(lengths.output_size(), 3087);
        assert_eq!(lengths.input_size() - lengths.input_overlap(), lengths.skip);
    }

    #[test]
    fn tempo_scales_the_skip_only() {
        let slow = WsolaLengths::from_params(&WsolaParams::speech(0.5, 16_000.0)).unwrap();
        let fast = WsolaLengths::from_params(&WsolaParams::speech(2.0, 16_000.0)).unwrap();

        assert_eq!(slow.output_size(), fast.output_size());
        assert_eq!(fast.skip, 4 * slow.skip);
    }

    #[test]
    fn automatic_preset_interpolates_between_the_ends() {
        let slow = WsolaParams::automatic(0.5, 44_100.0);
        let fast = WsolaParams::automatic(2.0, 44_100.0);
        let middle = WsolaParams::automatic(1.25, 44_100.0);

        assert_eq!((slow.sequence_ms, slow.seek_window_ms), (125.0, 25.0));
        assert_eq!((fast.sequence_ms, fast.seek_window_ms), (50.0, 15.0));
        assert_eq!((middle.sequence_ms, middle.seek_window_ms), (88.0, 20.0));
        assert_eq!(WsolaParams::automatic(8.0, 44_100.0).sequence_ms, 50.0);
    }

    #[test]
    fn rejects_unusable_parameters() {
        assert!(WsolaLengths::from_params(&WsolaParams::music(0.0, 44_100.0)).is_err());
        assert!(WsolaLengths::from_params(&WsolaParams::music(1.0, -1.0)).is_err());
        assert!(WsolaLengths::from_params(&WsolaParams::new(1.0, 44_100.0, 10.0, 5.0, 6.0)).is_err());
        assert!(WsolaLengths::from_params(&WsolaParams::new(1.0, 44_100.0, 40.0, 0.0, 12.0)).is_err());
    }

    #[test]
    fn output_length_does_not_depend_on_content() {
        let params = WsolaParams::speech(1.3, 8_000.0);
        let mut stretcher = WsolaStretcher::new(params).unwrap();
        let lengths = *stretcher.lengths();

        for seed in 0..4 {
            let input: Vec<f32> = (0..lengths.input_size())
                .map(|i| ((i * (seed + 1)) as f32 * 0.01).sin())
                .collect();
            let mut output = vec![f32::NAN; lengths.output_size()];

            let offset = stretcher.process(&input, &mut output);

            assert!(offset < lengths.seek);
            assert!(output.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn headroom_absorbs_moderate_overlap_growth() {
        let mut stretcher = WsolaStretcher::new(WsolaParams::speech(1.0, 8_000.0)).unwrap();
        let capacity = stretcher.carry_capacity();
        assert_eq!(capacity, stretcher.lengths().overlap * OVERLAP_HEADROOM);

        stretcher.configure(WsolaParams::slowdown(1.0, 8_000.0)).unwrap();
        assert_eq!(stretcher.carry_capacity(), capacity);

        stretcher
            .configure(WsolaParams::new(1.0, 8_000.0, 2_000.0, 35.0, 200.0))
            .unwrap();
        assert_eq!(stretcher.carry_capacity(), stretcher.lengths().overlap);
    }
}
