//! # Effect Blend and Wet/Dry Mix
//!
//! The last stage of the signal path. Two decisions are made per sample:
//!
//! 1. **Which effect?** An equal-power crossfade between the echo and the
//!    reverb. Equal-power (rather than linear) keeps the perceived level
//!    steady through the middle of the fade.
//! 2. **How much effect?** A linear blend between the untouched input and
//!    the crossfaded effect signal:
//!
//! ```text
//! wet    = crossfade(echo, reverb, f)
//! output = dry × (1 − w) + wet × w
//! ```

use super::util::{clamp, equal_power_crossfade, lerp};

/// Per-frame blend positions, both normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixParams {
    /// `0.0` = echo only, `1.0` = reverb only.
    pub crossfade: f32,

    /// `0.0` = input passes through untouched, `1.0` = fully processed.
    pub wet_dry: f32,
}

impl Default for MixParams {
    fn default() -> Self {
        Self {
            crossfade: 0.0,
            wet_dry: 0.5,
        }
    }
}

/// Blend one stereo frame. Out-of-range positions are clamped.
pub fn mix(
    dry: (f32, f32),
    echo: (f32, f32),
    reverb: (f32, f32),
    params: MixParams,
) -> (f32, f32) {
    let f = clamp(params.crossfade, 0.0, 1.0);
    let w = clamp(params.wet_dry, 0.0, 1.0);

    let wet_left = equal_power_crossfade(echo.0, reverb.0, f);
    let wet_right = equal_power_crossfade(echo.1, reverb.1, f);

    (lerp(dry.0, wet_left, w), lerp(dry.1, wet_right, w))
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DRY: (f32, f32) = (0.9, -0.9);
    const ECHO: (f32, f32) = (0.4, -0.4);
    const REVERB: (f32, f32) = (-0.2, 0.6);

    fn params(crossfade: f32, wet_dry: f32) -> MixParams {
        MixParams { crossfade, wet_dry }
    }

    #[test]
    fn test_fully_dry_passes_input() {
        assert_eq!(mix(DRY, ECHO, REVERB, params(0.3, 0.0)), DRY);
    }

    #[test]
    fn test_fully_wet_echo_only() {
        let (left, right) = mix(DRY, ECHO, REVERB, params(0.0, 1.0));
        assert!((left - ECHO.0).abs() < 1e-6, "Expected {}, got {left}", ECHO.0);
        assert!((right - ECHO.1).abs() < 1e-6, "Expected {}, got {right}", ECHO.1);
    }

    #[test]
    fn test_fully_wet_reverb_only() {
        let (left, right) = mix(DRY, ECHO, REVERB, params(1.0, 1.0));
        assert!((left - REVERB.0).abs() < 1e-6, "Expected {}, got {left}", REVERB.0);
        assert!((right - REVERB.1).abs() < 1e-6, "Expected {}, got {right}", REVERB.1);
    }

    /// Halfway through the fade each effect is weighted by √½.
    #[test]
    fn test_midpoint_weights() {
        let (left, _) = mix((0.0, 0.0), (1.0, 0.0), (0.0, 0.0), params(0.5, 1.0));
        assert!(
            (left - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6,
            "Expected 0.7071, got {left}"
        );
    }

    #[test]
    fn test_positions_are_clamped() {
        assert_eq!(
            mix(DRY, ECHO, REVERB, params(-3.0, -1.0)),
            mix(DRY, ECHO, REVERB, params(0.0, 0.0))
        );
        assert_eq!(
            mix(DRY, ECHO, REVERB, params(5.0, 2.0)),
            mix(DRY, ECHO, REVERB, params(1.0, 1.0))
        );
    }

    #[test]
    fn test_half_wet_is_linear_blend() {
        let (left, _) = mix((1.0, 0.0), (0.0, 0.0), (0.0, 0.0), params(0.0, 0.5));
        assert!((left - 0.5).abs() < 1e-6, "Expected 0.5, got {left}");
    }
}
