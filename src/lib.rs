//! # Console FX — Retro Console Echo and Reverb (AU/VST3/CLAP)
//!
//! Emulations of two classic game-console audio effects, built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug) and exported as
//! Audio Unit (AUv2), VST3, and CLAP from a single codebase:
//!
//! - a **16-bit console echo**: a 32 kHz integer ring buffer of up to
//!   240 ms with an 8-tap FIR filter in the feedback path, and
//! - a **32-bit console reverb**: the comb/all-pass network of the
//!   console's sound chip running at 22.05 kHz, with the ten presets its
//!   SDK shipped.
//!
//! Each model runs at its own native rate underneath whatever rate the
//! host picks, so echo lengths and reverb colour match the hardware at
//! 44.1, 48, or 96 kHz alike.
//!
//! ## Signal Flow
//!
//! ```text
//!                 ┌──► [Resampler ─► Echo  @ 32 kHz] ──┐
//! Input ──────────┤                                    ├──► crossfade ──┐
//!   │             └──► [Resampler ─► Reverb @ 22 kHz] ─┘                │
//!   │                                                                   ▼
//!   └───────────────────────────── dry ───────────────────────────► wet/dry ──► Output
//! ```
//!
//! The DSP core in [`dsp`] has no dependency on the plugin framework. Its
//! models work on caller-owned storage, so the same code runs inside this
//! plugin (boxed buffers allocated in `initialize()`) or on an embedded
//! target (static arrays).

pub mod dsp;
pub mod error;
mod params;

pub use error::{Error, Result};

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::chain::EffectChain;
use dsp::echo::{self, EchoModel, ECHO_NATIVE_RATE};
use dsp::reverb::{self, ReverbModel, ReverbPreset, REVERB_NATIVE_RATE};
use nih_plug::prelude::*;
use params::ConsoleFxParams;

/// The chain as the plugin owns it: both models on boxed slices that are
/// allocated once per `initialize()`.
type PluginChain = EffectChain<Box<[i16]>, Box<[f32]>>;

/// Allocate both models at their native rates and wire them to a host
/// running at `host_rate`.
///
/// The reverb workspace is sized for the longest preset, so later preset
/// switches never need more memory.
fn build_chain(host_rate: f32, preset: ReverbPreset) -> Result<PluginChain> {
    let echo_buffer = vec![0_i16; echo::desired_buffer_len(ECHO_NATIVE_RATE)];
    let echo = EchoModel::new(ECHO_NATIVE_RATE, echo_buffer.into_boxed_slice())?;

    let workspace = vec![0.0_f32; reverb::desired_buffer_len(REVERB_NATIVE_RATE)];
    let reverb = ReverbModel::new(REVERB_NATIVE_RATE, workspace.into_boxed_slice(), preset)?;

    Ok(EffectChain::new(host_rate, echo, reverb))
}

/// The main plugin struct.
///
/// Parameters are shared with the host through an `Arc`. Everything else
/// belongs to the audio thread and is only touched from `initialize()`,
/// `reset()`, and `process()`.
struct ConsoleFx {
    params: Arc<ConsoleFxParams>,

    /// Set during `initialize()`.
    sample_rate: f32,

    /// `None` until the host has told us the sample rate.
    chain: Option<PluginChain>,
}

impl Default for ConsoleFx {
    fn default() -> Self {
        Self {
            params: Arc::new(ConsoleFxParams::default()),
            // Placeholder until initialize().
            sample_rate: 44100.0,
            chain: None,
        }
    }
}

impl ConsoleFx {
    /// Follow the preset parameter. Switching clears the reverb, so this
    /// only runs when the selection actually changes.
    fn sync_preset(&mut self) {
        let Some(chain) = self.chain.as_mut() else {
            return;
        };

        let wanted = ReverbPreset::from(self.params.reverb_preset.value());
        if chain.reverb().preset() == wanted {
            return;
        }

        let result = chain.reverb_mut().set_preset(wanted);

        // Formatting a log line allocates; that is fine on a preset change.
        nih_plug::util::permit_alloc(|| match result {
            Ok(()) => nih_log!("Reverb preset switched to {}", wanted.name()),
            Err(err) => nih_error!("Reverb preset {} rejected: {err}", wanted.name()),
        });
    }
}

impl Plugin for ConsoleFx {
    const NAME: &'static str = "Console FX";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // The echo sums its input to mono and answers in inverted stereo, so
    // stereo comes first; mono tracks hear the left channel.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate both models for the host's sample rate.
    ///
    /// The echo buffer (7680 × i16) and the reverb workspace (65536 × f32)
    /// only depend on the models' native rates, so their sizes are the
    /// same at every host rate. Only the resamplers change.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        self.sample_rate = buffer_config.sample_rate;
        let preset = ReverbPreset::from(self.params.reverb_preset.value());

        match build_chain(self.sample_rate, preset) {
            Ok(chain) => {
                nih_log!(
                    "Console FX ready at {} Hz: echo buffer {} samples, reverb workspace {} samples, preset {}",
                    self.sample_rate,
                    chain.echo().capacity(),
                    chain.reverb().capacity(),
                    preset.name()
                );
                self.chain = Some(chain);
                true
            }
            Err(err) => {
                nih_error!("Console FX failed to initialize at {} Hz: {err}", self.sample_rate);
                self.chain = None;
                false
            }
        }
    }

    /// Drop every echo and reverb tail so stale audio doesn't bleed into
    /// the next playback.
    fn reset(&mut self) {
        if let Some(chain) = self.chain.as_mut() {
            chain.clear();
        }
    }

    /// Per sample:
    ///
    /// 1. **Read** the smoothed knob values into the models' configs
    /// 2. **Run** the frame through both resampled models
    /// 3. **Blend** echo against reverb, then wet against dry
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        self.sync_preset();

        let params = &self.params;
        let Some(chain) = self.chain.as_mut() else {
            return ProcessStatus::Normal;
        };

        for mut channel_samples in buffer.iter_samples() {
            let echo_config = &mut chain.echo_mut().config;
            echo_config.buffer_size = params.echo_size.smoothed.next();
            echo_config.delay_mod = params.echo_delay_mod.smoothed.next();
            echo_config.feedback = params.echo_feedback.smoothed.next();
            echo_config.filter = params.echo_filter.smoothed.next();

            chain.reverb_mut().config.output_level = params.reverb_level.smoothed.next();

            chain.mix.crossfade = params.crossfade.smoothed.next();
            chain.mix.wet_dry = params.mix.smoothed.next();

            let left = channel_samples.get_mut(0).map_or(0.0, |s| *s);
            // Mono tracks feed the same sample to both sides.
            let right = channel_samples.get_mut(1).map_or(left, |s| *s);

            let (out_left, out_right) = chain.process(left, right);

            if let Some(sample) = channel_samples.get_mut(0) {
                *sample = out_left;
            }
            if let Some(sample) = channel_samples.get_mut(1) {
                *sample = out_right;
            }
        }

        // Keep process() running after the input stops so neither tail is
        // cut off.
        let tail = chain.echo_tail_samples(self.sample_rate)
            + chain.reverb_tail_samples(self.sample_rate);
        ProcessStatus::Tail(tail as u32)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for ConsoleFx {
    const CLAP_ID: &'static str = "com.loveless-audio.console-fx-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Retro console echo and reverb emulation");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
        ClapFeature::Reverb,
    ];
}

impl Vst3Plugin for ConsoleFx {
    const VST3_CLASS_ID: [u8; 16] = *b"ConsoleFxEcho001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Delay,
        Vst3SubCategory::Reverb,
    ];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper re-exports the CLAP entry point as AUv2 so Logic Pro
// (Audio Units only) can load it.

nih_export_clap!(ConsoleFx);
nih_export_vst3!(ConsoleFx);

clap_wrapper::export_auv2!();

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
