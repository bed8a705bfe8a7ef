//! # Small Numeric Helpers
//!
//! Pure, stateless helpers shared by every stage of the signal path. None
//! of them allocate or branch on buffer size, so they are safe to call
//! once per sample from the audio thread.

use std::f32::consts::FRAC_PI_2;

/// Clamp `value` into `[min, max]`.
///
/// NaN collapses to `min`, so a garbage control value can never leak into
/// buffer index arithmetic.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value > max {
        max
    } else if value >= min {
        value
    } else {
        min
    }
}

/// Linear interpolation: `a` at `t = 0`, `b` at `t = 1`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Equal-power (quarter-sine) crossfade from `a` to `b`.
///
/// ```text
/// out = a * sin((1 - t) * π/2) + b * sin(t * π/2)
/// ```
///
/// The two weights are the sine and cosine of the same angle, so their
/// squares always sum to one. Two uncorrelated signals faded this way keep
/// a constant perceived loudness, where a linear crossfade would dip by
/// about 3 dB at the midpoint.
///
/// At `t = 0` the result is exactly `a` and at `t = 1` exactly `b`: the
/// f32 value of π/2 has a sine that rounds to exactly `1.0`.
#[inline]
pub fn equal_power_crossfade(a: f32, b: f32, t: f32) -> f32 {
    a * ((1.0 - t) * FRAC_PI_2).sin() + b * (t * FRAC_PI_2).sin()
}

/// Round `value` to the nearest multiple of `increment` (halves round up).
#[inline]
pub fn round_to(value: f32, increment: f32) -> f32 {
    (value / increment + 0.5).floor() * increment
}

/// Smallest power of two greater than or equal to `value` (`1` for `0`).
#[inline]
pub fn ceil_pow2(value: usize) -> usize {
    value.max(1).next_power_of_two()
}

/// Largest power of two less than or equal to `value` (`0` for `0`).
#[inline]
pub fn floor_pow2(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - value.leading_zeros())
    }
}

/// Convert a float sample in `[-1, 1]` to signed 16-bit, saturating at the
/// representable range instead of wrapping.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    // `as` from f32 saturates and maps NaN to zero.
    (sample * i16::MAX as f32) as i16
}

#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / i16::MAX as f32
}

/// Saturate a wide intermediate to the signed 16-bit range.
#[inline]
pub fn saturate_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
        assert_eq!(clamp(f32::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(0.2, 0.8, 0.0), 0.2);
        assert!((lerp(0.2, 0.8, 1.0) - 0.8).abs() < 1e-6);
        assert!((lerp(0.0, 1.0, 0.25) - 0.25).abs() < 1e-6);
    }

    /// The endpoints must be exact, not merely close: a fully-faded
    /// control should never bleed the other effect into the output.
    #[test]
    fn test_crossfade_endpoints_are_exact() {
        assert_eq!(equal_power_crossfade(0.3, -0.7, 0.0), 0.3);
        assert_eq!(equal_power_crossfade(0.3, -0.7, 1.0), -0.7);
    }

    #[test]
    fn test_crossfade_is_constant_power() {
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            let wa = equal_power_crossfade(1.0, 0.0, t);
            let wb = equal_power_crossfade(0.0, 1.0, t);
            let power = wa * wa + wb * wb;
            assert!(
                (power - 1.0).abs() < 1e-5,
                "Weights at t = {t} should have unit power, got {power}"
            );
        }
    }

    #[test]
    fn test_round_to_increment() {
        assert_eq!(round_to(3840.0, 512.0), 4096.0);
        assert_eq!(round_to(3800.0, 512.0), 3584.0);
        assert_eq!(round_to(0.0, 512.0), 0.0);
        assert_eq!(round_to(7680.0, 512.0), 7680.0);
    }

    #[test]
    fn test_power_of_two_helpers() {
        assert_eq!(ceil_pow2(0), 1);
        assert_eq!(ceil_pow2(49184), 65536);
        assert_eq!(ceil_pow2(65536), 65536);
        assert_eq!(floor_pow2(0), 0);
        assert_eq!(floor_pow2(65536), 65536);
        assert_eq!(floor_pow2(100_000), 65536);
    }

    #[test]
    fn test_sample_conversions_saturate() {
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(4.0), i16::MAX);
        assert_eq!(f32_to_i16(-4.0), i16::MIN);
        assert_eq!(f32_to_i16(f32::NAN), 0);
        assert_eq!(i16_to_f32(i16::MAX), 1.0);
        assert_eq!(saturate_i16(40_000), i16::MAX);
        assert_eq!(saturate_i16(-40_000), i16::MIN);
    }
}
