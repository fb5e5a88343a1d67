//! Cross-correlation seam search for overlap-add splicing.

/*
Finding the Best Splice Point
=============================

When two stretches of audio are glued together with a short crossfade, the
result only sounds smooth if the two waveforms line up: peaks on peaks,
troughs on troughs. If they are out of phase the crossfade partially cancels
and you hear a dip or a click.

So before splicing we search. We hold the tail of the previous segment (the
"reference") fixed and slide it across a range of candidate positions in the
new input, scoring how similar the waveforms are at each position.

Vocabulary
----------

  reference     The carried-over samples that the next segment will be
                crossfaded with.

  seek length   How many candidate offsets to try. Longer = better matches,
                more CPU, more timing jitter.

  correlation   Sum of products of two aligned blocks. Large and positive
                when the blocks move together.


Triangular Taper
----------------

Samples near the middle of the overlap matter most: at the edges the
crossfade weight of one side is already close to zero. The reference is
pre-multiplied by a parabola-like taper before the search:

    weight[i] = i × (overlap - i)

    weight
      ▲        ╭───╮
      │      ╭─╯   ╰─╮
      │    ╭─╯       ╰─╮
      │  ╭─╯           ╰─╮
      └──┴───────────────┴──▶ i
         0              overlap

The taper is folded into the reference once per window, so every candidate
offset costs a single dot product.


Score
-----

    corr(τ)  = Σ ref[i] × input[τ + i]         for i in 1..overlap
    energy   = Σ ref[i]²                       (clamped: < 1e-8 → 1)
    score(τ) = (corr(τ) / sqrt(energy) + 0.1) × (1 - 0.25 t²)

    t = (2τ - seek_length) / seek_length       ∈ [-1, 1)

The energy clamp keeps a silent reference from dividing by zero. The last
factor is a mild bias toward the centre of the seek range: offsets at the
edges lose up to 25% of their score. Without it the search tends to drift
toward one end, which shows up as a slowly wandering tempo.

The first sample (i = 0) has zero taper weight and is skipped.
*/

/// Energies below this are treated as 1 to avoid dividing by zero.
pub const MIN_REFERENCE_ENERGY: f64 = 1e-8;

/// Weight the carried-over samples with the triangular taper.
///
/// `reference` and `carry` must be at least `overlap` long.
#[inline]
pub fn weight_reference(carry: &[f32], reference: &mut [f32], overlap: usize) {
    debug_assert!(carry.len() >= overlap && reference.len() >= overlap);

    for (i, (r, &c)) in reference[..overlap]
        .iter_mut()
        .zip(carry[..overlap].iter())
        .enumerate()
    {
        let taper = (i * (overlap - i)) as f32;
        *r = c * taper;
    }
}

/// Correlation of `reference` with `compare`, normalized by the reference
/// energy.
#[inline]
pub fn cross_correlation(reference: &[f32], compare: &[f32]) -> f64 {
    debug_assert!(compare.len() >= reference.len());

    let mut corr = 0.0f64;
    let mut norm = 0.0f64;
    for (&r, &c) in reference.iter().zip(compare.iter()).skip(1) {
        corr += r as f64 * c as f64;
        norm += r as f64 * r as f64;
    }
    if norm < MIN_REFERENCE_ENERGY {
        norm = 1.0;
    }
    corr / norm.sqrt()
}

/// Centre-favouring weight for candidate `offset` out of `seek_length`.
#[inline]
pub fn center_bias(offset: usize, seek_length: usize) -> f64 {
    let t = (2.0 * offset as f64 - seek_length as f64) / seek_length as f64;
    1.0 - 0.25 * t * t
}

/// Try every offset in `0..seek_length` and return the one whose biased
/// score is highest. Ties keep the earliest offset.
///
/// `input` must hold at least `seek_length - 1 + reference.len()` samples.
pub fn best_overlap_offset(reference: &[f32], input: &[f32], seek_length: usize) -> usize {
    let overlap = reference.len();
    debug_assert!(seek_length == 0 || input.len() >= seek_length - 1 + overlap);

    let mut best_offset = 0;
    let mut best_score = f64::NEG_INFINITY;

    for offset in 0..seek_length {
        let corr = cross_correlation(reference, &input[offset..offset + overlap]);
        let score = (corr + 0.1) * center_bias(offset, seek_length);

        if score > best_score {
            best_score = score;
            best_offset = offset;
        }
    }

    best_offset
}
