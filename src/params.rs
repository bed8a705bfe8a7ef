//! # Plugin Parameters
//!
//! The knobs the DAW shows. Each one maps onto a field of one of the core's
//! plain configuration structures:
//!
//! | Parameter      | Core field                      |
//! |----------------|---------------------------------|
//! | Echo Size      | `EchoConfig::buffer_size`       |
//! | Echo Head      | `EchoConfig::delay_mod`         |
//! | Feedback       | `EchoConfig::feedback`          |
//! | Echo Filter    | `EchoConfig::filter`            |
//! | Reverb         | `ReverbModel::set_preset`       |
//! | Reverb Level   | `ReverbConfig::output_level`    |
//! | Echo ↔ Reverb  | `MixParams::crossfade`          |
//! | Mix            | `MixParams::wet_dry`            |
//!
//! All continuous parameters are already normalized to `[0, 1]`, matching
//! the core's configuration ranges, so no conversion happens on the audio
//! thread beyond smoothing.
//!
//! Once published, never change the `#[id = "..."]` strings or existing
//! presets will break.

use nih_plug::prelude::*;

use crate::dsp::reverb::ReverbPreset;

#[derive(Params)]
pub struct ConsoleFxParams {
    /// **Echo Size** — loop length, up to 240 ms in 16 ms steps.
    ///
    /// The new length takes effect the next time the write head reaches
    /// the end of the current loop, exactly as on the hardware, so sweeping
    /// this knob produces stepped, glitch-free jumps.
    #[id = "size"]
    pub echo_size: FloatParam,

    /// **Echo Head** — where the read head sits inside the loop. Sweeping
    /// it gives chorus-like pitch wobble.
    #[id = "head"]
    pub echo_delay_mod: FloatParam,

    /// **Feedback** — how much of each repeat is fed back.
    ///
    /// Capped at 98% for the same reason a delay pedal caps it: at 100%
    /// the echo never decays.
    #[id = "fdbk"]
    pub echo_feedback: FloatParam,

    /// **Echo Filter** — morphs the FIR filter from flat to the target
    /// response.
    #[id = "filt"]
    pub echo_filter: FloatParam,

    /// **Reverb** — which SDK preset the reverb runs.
    ///
    /// Switching presets clears the reverb's work area, so it is not
    /// smoothed.
    #[id = "rvb"]
    pub reverb_preset: EnumParam<ReverbPresetParam>,

    #[id = "rlvl"]
    pub reverb_level: FloatParam,

    /// **Echo ↔ Reverb** — equal-power crossfade between the two effects.
    #[id = "xfade"]
    pub crossfade: FloatParam,

    /// **Mix** — dry/wet balance.
    #[id = "mix"]
    pub mix: FloatParam,
}

/// Host-facing mirror of [`ReverbPreset`]. nih-plug's `Enum` derive needs
/// to own the type it describes, so the core's enum stays free of plugin
/// framework attributes.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReverbPresetParam {
    Off,
    Room,
    #[name = "Studio Small"]
    StudioSmall,
    #[name = "Studio Medium"]
    StudioMedium,
    #[name = "Studio Large"]
    StudioLarge,
    Hall,
    #[name = "Half Echo"]
    HalfEcho,
    #[name = "Space Echo"]
    SpaceEcho,
    #[name = "Chaos Echo"]
    ChaosEcho,
    Delay,
}

impl From<ReverbPresetParam> for ReverbPreset {
    fn from(value: ReverbPresetParam) -> Self {
        match value {
            ReverbPresetParam::Off => ReverbPreset::Off,
            ReverbPresetParam::Room => ReverbPreset::Room,
            ReverbPresetParam::StudioSmall => ReverbPreset::StudioSmall,
            ReverbPresetParam::StudioMedium => ReverbPreset::StudioMedium,
            ReverbPresetParam::StudioLarge => ReverbPreset::StudioLarge,
            ReverbPresetParam::Hall => ReverbPreset::Hall,
            ReverbPresetParam::HalfEcho => ReverbPreset::HalfEcho,
            ReverbPresetParam::SpaceEcho => ReverbPreset::SpaceEcho,
            ReverbPresetParam::ChaosEcho => ReverbPreset::ChaosEcho,
            ReverbPresetParam::Delay => ReverbPreset::Delay,
        }
    }
}

/// A normalized `[0, 1]` parameter displayed as a percentage.
fn percentage(name: &str, default: f32, max: f32) -> FloatParam {
    FloatParam::new(name, default, FloatRange::Linear { min: 0.0, max })
        .with_unit("%")
        .with_smoother(SmoothingStyle::Linear(20.0))
        .with_value_to_string(formatters::v2s_f32_percentage(1))
        .with_string_to_value(formatters::s2v_f32_percentage())
}

impl Default for ConsoleFxParams {
    fn default() -> Self {
        Self {
            echo_size: percentage("Echo Size", 0.5, 1.0),

            // Full-length read head: the delay equals the loop length.
            echo_delay_mod: percentage("Echo Head", 1.0, 1.0),

            echo_feedback: percentage("Feedback", 0.4, 0.98),

            echo_filter: percentage("Echo Filter", 0.0, 1.0),

            reverb_preset: EnumParam::new("Reverb", ReverbPresetParam::Hall),

            reverb_level: percentage("Reverb Level", 1.0, 1.0),

            // Equal-power crossfades sound best when the knob moves
            // slowly, so give it a longer ramp than the others.
            crossfade: percentage("Echo / Reverb", 0.0, 1.0)
                .with_smoother(SmoothingStyle::Linear(50.0)),

            mix: percentage("Mix", 0.5, 1.0),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
