//! # Per-Frame Effect Chain
//!
//! Wires the pieces together in the order a frame travels through them:
//!
//! ```text
//!               ┌─► [Resampler → Echo @ 32 kHz]   ──┐
//! host frame ───┤                                   ├─► crossfade ─► wet/dry ─► out
//!       │       └─► [Resampler → Reverb @ 22 kHz] ──┘                  ▲
//!       └──────────────────────── dry ─────────────────────────────────┘
//! ```
//!
//! Nothing is buffered across frames apart from the models' own delay
//! lines, so every call costs the same bounded amount of work.

use super::echo::EchoModel;
use super::mixer::{mix, MixParams};
use super::resampler::Resampler;
use super::reverb::ReverbModel;

pub struct EffectChain<E, R> {
    pub mix: MixParams,

    echo: EchoModel<E>,
    reverb: ReverbModel<R>,
    echo_resampler: Resampler,
    reverb_resampler: Resampler,
}

impl<E, R> EffectChain<E, R>
where
    E: AsRef<[i16]> + AsMut<[i16]>,
    R: AsRef<[f32]> + AsMut<[f32]>,
{
    /// Drive `echo` and `reverb` from a host running at `host_rate`.
    ///
    /// Each model is resampled from whatever rate it was built for, which
    /// is normally its native rate.
    pub fn new(host_rate: f32, echo: EchoModel<E>, reverb: ReverbModel<R>) -> Self {
        Self {
            mix: MixParams::default(),
            echo_resampler: Resampler::new(host_rate, echo.sample_rate()),
            reverb_resampler: Resampler::new(host_rate, reverb.sample_rate()),
            echo,
            reverb,
        }
    }

    /// Process one host-rate frame.
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let echo = self.echo_resampler.process_with(left, right, &mut self.echo);
        let reverb = self
            .reverb_resampler
            .process_with(left, right, &mut self.reverb);

        mix((left, right), echo, reverb, self.mix)
    }

    /// Silence both models and forget any held resampler output.
    pub fn clear(&mut self) {
        self.echo.clear_buffer();
        self.reverb.clear_buffer();
        self.echo_resampler.reset();
        self.reverb_resampler.reset();
    }

    pub fn echo(&self) -> &EchoModel<E> {
        &self.echo
    }

    pub fn echo_mut(&mut self) -> &mut EchoModel<E> {
        &mut self.echo
    }

    pub fn reverb(&self) -> &ReverbModel<R> {
        &self.reverb
    }

    pub fn reverb_mut(&mut self) -> &mut ReverbModel<R> {
        &mut self.reverb
    }

    /// Rough estimate of how long the echo keeps ringing, in host samples,
    /// at the current settings.
    pub fn echo_tail_samples(&self, host_rate: f32) -> f32 {
        let echo_len = self.echo.effective_len() as f32 * host_rate / self.echo.sample_rate();
        let feedback = self.echo.config.combined(&self.echo.modulation).feedback;

        if feedback > 0.001 {
            // Repeats until the level falls by 60 dB: feedback^n = 0.001.
            let repeats = -3.0 / feedback.log10();
            repeats * echo_len
        } else {
            echo_len
        }
    }

    /// Worst-case reverb ring-out in host samples: one trip around the
    /// work area.
    pub fn reverb_tail_samples(&self, host_rate: f32) -> f32 {
        self.reverb.capacity() as f32 * host_rate / self.reverb.sample_rate()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::echo::{self, ECHO_NATIVE_RATE};
    use crate::dsp::reverb::{self, REVERB_NATIVE_RATE};

    type TestChain = EffectChain<Vec<i16>, Vec<f32>>;

    fn chain(host_rate: f32) -> TestChain {
        let echo = EchoModel::new(
            ECHO_NATIVE_RATE,
            vec![0; echo::desired_buffer_len(ECHO_NATIVE_RATE)],
        )
        .unwrap();
        let reverb = ReverbModel::new(
            REVERB_NATIVE_RATE,
            vec![0.0; reverb::desired_buffer_len(REVERB_NATIVE_RATE)],
            reverb::ReverbPreset::Hall,
        )
        .unwrap();
        EffectChain::new(host_rate, echo, reverb)
    }

    #[test]
    fn test_fully_dry_is_transparent() {
        let mut fx = chain(48000.0);
        fx.mix = MixParams {
            crossfade: 0.5,
            wet_dry: 0.0,
        };
        fx.echo_mut().config.feedback = 0.8;

        for i in 0..10_000 {
            let x = (i as f32 * 0.05).sin() * 0.5;
            assert_eq!(fx.process(x, -x), (x, -x));
        }
    }

    /// Host at the echo's native rate, echo only, fully wet: the impulse
    /// comes back one buffer length later, plus the resampler's one-tick
    /// hold.
    #[test]
    fn test_echo_impulse_through_chain() {
        let mut fx = chain(ECHO_NATIVE_RATE);
        fx.mix = MixParams {
            crossfade: 0.0,
            wet_dry: 1.0,
        };

        let len = fx.echo().effective_len();
        fx.process(1.0, 1.0);

        let mut hits = Vec::new();
        for tick in 1..3 * len {
            let (left, right) = fx.process(0.0, 0.0);
            if left != 0.0 {
                hits.push(tick);
                assert!(right < 0.0, "Echo right channel should be inverted");
            }
        }

        assert_eq!(hits, vec![len + 1]);
    }

    /// A 48 kHz host still hears the echo at 240 ms.
    #[test]
    fn test_echo_timing_survives_resampling() {
        let mut fx = chain(48000.0);
        fx.mix = MixParams {
            crossfade: 0.0,
            wet_dry: 1.0,
        };

        // The first native tick falls on the second host tick, so hold
        // the impulse for two host samples.
        fx.process(1.0, 1.0);
        fx.process(1.0, 1.0);
        let first: usize = (2..48000)
            .find(|_| fx.process(0.0, 0.0).0.abs() > 1e-4)
            .expect("echo should return within a second");

        let expected = (0.240 * 48000.0) as usize;
        assert!(
            first.abs_diff(expected) <= 3,
            "Expected the echo near sample {expected}, got {first}"
        );
    }

    #[test]
    fn test_reverb_only_silence() {
        let mut fx = chain(44100.0);
        fx.mix = MixParams {
            crossfade: 1.0,
            wet_dry: 1.0,
        };

        for _ in 0..20_000 {
            assert_eq!(fx.process(0.0, 0.0), (0.0, 0.0));
        }
    }

    #[test]
    fn test_clear_silences_everything() {
        let mut fx = chain(44100.0);
        fx.mix = MixParams {
            crossfade: 0.5,
            wet_dry: 1.0,
        };
        fx.echo_mut().config.feedback = 0.7;

        for i in 0..20_000 {
            let x = ((i % 100) as f32 / 50.0) - 1.0;
            fx.process(x, x);
        }

        fx.clear();
        fx.echo_mut().config.feedback = 0.0;

        for _ in 0..20_000 {
            let (left, right) = fx.process(0.0, 0.0);
            assert_eq!((left, right), (0.0, 0.0));
        }
    }

    #[test]
    fn test_tail_estimates() {
        let mut fx = chain(32000.0);
        assert_eq!(fx.echo_tail_samples(32000.0), 7680.0);

        fx.echo_mut().config.feedback = 0.5;
        let tail = fx.echo_tail_samples(32000.0);
        assert!(tail > 7680.0 * 9.0 && tail < 7680.0 * 10.5, "Got {tail}");

        assert_eq!(fx.reverb_tail_samples(22050.0), 65536.0);
    }

    /// Models built away from their native rates still report tails in
    /// host samples.
    #[test]
    fn test_tail_estimates_follow_model_rates() {
        let echo = EchoModel::new(48000.0, vec![0; echo::desired_buffer_len(48000.0)]).unwrap();
        let reverb = ReverbModel::new(
            44100.0,
            vec![0.0; reverb::desired_buffer_len(44100.0)],
            reverb::ReverbPreset::Hall,
        )
        .unwrap();
        let fx = EffectChain::new(48000.0, echo, reverb);

        assert_eq!(fx.echo().effective_len(), 11520);
        assert_eq!(fx.echo_tail_samples(48000.0), 11520.0);
        assert_eq!(fx.reverb_tail_samples(44100.0), 131072.0);
    }
}
