//! Linear overlap crossfade used when splicing segments.

/*
Overlap Crossfade
=================

A splice fades the old segment out while the new one fades in, over
`overlap` samples. The weights are linear and always sum to one, the same
linear crossfade as `mix`, but with the balance sweeping from 0 to 1 across
the block instead of staying fixed:

    out[i] = ( new[i] × i + old[i] × (overlap - i) ) / overlap

    weight
      1 ┐╲                  ╱
        │  ╲   old    new  ╱
        │    ╲          ╱
        │      ╲      ╱
      0 └────────╲──╱────────▶ i
        0               overlap

At i = 0 the output is purely the old segment, so a splice continues
exactly where the previous output ended.
*/

/// Crossfade `old` into `new` over `out.len()` samples.
#[inline]
pub fn overlap_add(out: &mut [f32], old: &[f32], new: &[f32]) {
    let overlap = out.len();
    debug_assert!(old.len() >= overlap && new.len() >= overlap);
    if overlap == 0 {
        return;
    }

    let scale = 1.0 / overlap as f32;
    for (i, ((o, &prev), &next)) in out
        .iter_mut()
        .zip(old.iter())
        .zip(new.iter())
        .enumerate()
    {
        let fade_in = i as f32;
        let fade_out = (overlap - i) as f32;
        *o = (next * fade_in + prev * fade_out) * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn starts_on_the_old_segment() {
        let mut out = [0.0; 4];
        overlap_add(&mut out, &[1.0; 4], &[-1.0; 4]);

        assert_eq!(out[0], 1.0);
        assert_abs_diff_eq!(out[2], 0.0);
        assert_abs_diff_eq!(out[3], -0.5);
    }

    #[test]
    fn equal_segments_pass_through() {
        let signal = [0.3, -0.2, 0.9, 0.1, -0.7];
        let mut out = [0.0; 5];

        overlap_add(&mut out, &signal, &signal);

        for (a, b) in out.iter().zip(signal.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn empty_overlap_is_a_no_op() {
        let mut out: [f32; 0] = [];
        overlap_add(&mut out, &[], &[]);
    }
}
