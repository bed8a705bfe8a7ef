//! # Fractional Resampler
//!
//! Each effect model is written for one fixed "native" sample rate: the
//! echo runs at 32 kHz and the reverb at 22.05 kHz, because that is what
//! the emulated hardware did and the character of both effects depends on
//! it. The host, on the other hand, runs at whatever rate the user picked.
//!
//! The resampler decouples the two. It is driven once per host sample and
//! calls a *producer* (the model's per-tick step) whenever enough time has
//! passed for one native sample:
//!
//! ```text
//! host ticks:    |    |    |    |    |    |    |    |      (driving rate)
//! native ticks:  |      |      |      |      |      |      (driven rate)
//!                ^ producer runs here, 0..n times per host tick
//! ```
//!
//! ## The Phase Accumulator
//!
//! `period` is the length of one native tick measured in host ticks:
//!
//! ```text
//! period = driving_rate / driven_rate
//! ```
//!
//! Every host tick adds 1 to `phase`. Each time `phase` reaches `period`
//! we run the producer once and subtract `period`. With a period of 0.5
//! (native rate twice the host rate) the producer runs twice per host
//! tick; with a period of 2 it runs every other host tick.
//!
//! ## Reconstruction
//!
//! The host needs a value on every one of its ticks, which generally fall
//! between native ticks. We keep the two most recent native outputs and
//! linearly interpolate between them at `t = phase / period`.
//!
//! No anti-aliasing filter is applied before rate reduction. At large
//! ratios this aliases; that grit is part of the emulated sound.

use super::util::lerp;

/// A stereo per-tick processor: one frame in, one frame out.
///
/// This is the capability the resampler drives. Both effect models
/// implement it; any `FnMut(f32, f32) -> (f32, f32)` closure does too.
pub trait StereoProcessor {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32);
}

impl<F> StereoProcessor for F
where
    F: FnMut(f32, f32) -> (f32, f32),
{
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        self(left, right)
    }
}

pub struct Resampler {
    /// Native tick length in driving ticks. Fixed for the instance.
    period: f32,

    /// Host ticks accumulated since the last native tick.
    phase: f32,

    last_left: f32,
    last_right: f32,
    next_left: f32,
    next_right: f32,
}

impl Resampler {
    /// Create a resampler driven at `driving_rate` feeding a model that
    /// runs at `driven_rate`.
    ///
    /// A rate that is zero, negative or not finite would produce a
    /// period the accumulator can never cross (or crosses forever), so
    /// such configurations fall back to a unity period.
    pub fn new(driving_rate: f32, driven_rate: f32) -> Self {
        let period = driving_rate / driven_rate;
        let period = if period.is_finite() && period > 0.0 {
            period
        } else {
            1.0
        };

        Self {
            period,
            phase: 0.0,
            last_left: 0.0,
            last_right: 0.0,
            next_left: 0.0,
            next_right: 0.0,
        }
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    /// Advance by one driving tick and return the interpolated output.
    ///
    /// `producer` maps one native-rate stereo input to one native-rate
    /// stereo output. It is called zero or more times, always with this
    /// tick's input.
    ///
    /// The crossing test is `>=` rather than `>`: at a unity period the
    /// accumulator lands exactly on `period` every tick, and a strict
    /// comparison would never fire, freezing the output while `phase`
    /// grows without bound.
    pub fn process<F>(&mut self, left: f32, right: f32, mut producer: F) -> (f32, f32)
    where
        F: FnMut(f32, f32) -> (f32, f32),
    {
        self.phase += 1.0;

        while self.phase >= self.period {
            self.last_left = self.next_left;
            self.last_right = self.next_right;
            (self.next_left, self.next_right) = producer(left, right);
            self.phase -= self.period;
        }

        let t = self.phase / self.period;
        (
            lerp(self.last_left, self.next_left, t),
            lerp(self.last_right, self.next_right, t),
        )
    }

    /// [`process`](Self::process) with any [`StereoProcessor`] as producer.
    pub fn process_with<P>(&mut self, left: f32, right: f32, processor: &mut P) -> (f32, f32)
    where
        P: StereoProcessor + ?Sized,
    {
        self.process(left, right, |l, r| processor.process(l, r))
    }

    /// Forget the held outputs and the accumulated phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.last_left = 0.0;
        self.last_right = 0.0;
        self.next_left = 0.0;
        self.next_right = 0.0;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// At equal rates a constant input must come out as the same constant
    /// and stay there. This is the configuration a strict `>` comparison
    /// would freeze.
    #[test]
    fn test_unity_ratio_holds_constant() {
        let mut rs = Resampler::new(32000.0, 32000.0);

        let mut out = (0.0, 0.0);
        for _ in 0..10_000 {
            out = rs.process(0.6, -0.4, |l, r| (l, r));
        }

        assert!((out.0 - 0.6).abs() < 1e-6, "Expected 0.6, got {}", out.0);
        assert!((out.1 + 0.4).abs() < 1e-6, "Expected -0.4, got {}", out.1);
        assert!(rs.phase < rs.period, "Phase must stay bounded, got {}", rs.phase);
    }

    #[test]
    fn test_unity_ratio_calls_producer_once_per_tick() {
        let mut rs = Resampler::new(48000.0, 48000.0);
        let mut calls = 0;
        for _ in 0..1000 {
            rs.process(0.0, 0.0, |l, r| {
                calls += 1;
                (l, r)
            });
        }
        assert_eq!(calls, 1000);
    }

    /// Native rate twice the host rate: two producer calls per host tick.
    #[test]
    fn test_upsampling_calls_producer_twice_per_tick() {
        let mut rs = Resampler::new(16000.0, 32000.0);
        assert_eq!(rs.period(), 0.5);

        let mut calls = 0;
        for _ in 0..1000 {
            rs.process(0.0, 0.0, |l, r| {
                calls += 1;
                (l, r)
            });
        }
        assert_eq!(calls, 2000);
    }

    #[test]
    fn test_downsampling_call_rate() {
        // 48 kHz host driving the 32 kHz echo: two native ticks per three
        // host ticks.
        let mut rs = Resampler::new(48000.0, 32000.0);

        let mut calls = 0_i32;
        for _ in 0..48000 {
            rs.process(0.0, 0.0, |l, r| {
                calls += 1;
                (l, r)
            });
        }
        assert!(
            (calls - 32000).abs() <= 1,
            "Expected about 32000 native ticks, got {calls}"
        );
    }

    /// Between native ticks the output is a straight line between the two
    /// most recent native outputs.
    #[test]
    fn test_interpolates_between_native_ticks() {
        // Period 2: the producer runs on every second host tick.
        let mut rs = Resampler::new(2.0, 1.0);
        let mut next_value = 0.0_f32;
        let mut producer = |_: f32, _: f32| {
            next_value += 1.0;
            (next_value, -next_value)
        };

        // Tick 1: phase 1, no native tick yet, halfway between 0 and 0.
        let a = rs.process(0.0, 0.0, &mut producer);
        assert_eq!(a, (0.0, 0.0));

        // Tick 2: native tick produces 1.0, phase wraps to 0 → last (0.0).
        let b = rs.process(0.0, 0.0, &mut producer);
        assert_eq!(b, (0.0, 0.0));

        // Tick 3: phase 1 of 2 → halfway between 0.0 and 1.0.
        let c = rs.process(0.0, 0.0, &mut producer);
        assert!((c.0 - 0.5).abs() < 1e-6, "Expected 0.5, got {}", c.0);
        assert!((c.1 + 0.5).abs() < 1e-6, "Expected -0.5, got {}", c.1);
    }

    #[test]
    fn test_invalid_rates_fall_back_to_unity() {
        assert_eq!(Resampler::new(48000.0, 0.0).period(), 1.0);
        assert_eq!(Resampler::new(0.0, 48000.0).period(), 1.0);
        assert_eq!(Resampler::new(f32::NAN, 48000.0).period(), 1.0);
    }

    #[test]
    fn test_process_with_stereo_processor() {
        struct Swap;
        impl StereoProcessor for Swap {
            fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
                (right, left)
            }
        }

        let mut rs = Resampler::new(1.0, 1.0);
        let mut swap = Swap;
        rs.process_with(0.25, 0.75, &mut swap);
        let out = rs.process_with(0.25, 0.75, &mut swap);
        assert_eq!(out, (0.75, 0.25));
    }

    #[test]
    fn test_reset_clears_held_output() {
        let mut rs = Resampler::new(1.0, 1.0);
        rs.process(1.0, 1.0, |l, r| (l, r));
        rs.process(1.0, 1.0, |l, r| (l, r));
        rs.reset();

        let out = rs.process(0.0, 0.0, |l, r| (l, r));
        assert_eq!(out, (0.0, 0.0));
    }
}
