//! # Console Hardware Reverb Model
//!
//! An emulation of a 32-bit console's sound-chip reverb: one shared work
//! area of memory, a cursor that advances one sample per tick, and a fixed
//! network of taps at offsets from that cursor. The offsets and gains come
//! from a preset, and the character of the effect depends entirely on them.
//!
//! ## Topology (per channel, per tick)
//!
//! ```text
//!             ┌─ same-side reflection ─┐
//! in × vIN ───┤                        ├─► work area
//!             └─ cross-side reflection ┘        │
//!                  (IIR: vIIR, vWALL)           │
//!                                               ▼
//!   Σ vCOMBn × [mCOMBn]  ──►  all-pass 1  ──►  all-pass 2  ──► out
//!   (4 comb taps)            (vAPF1, dAPF1)   (vAPF2, dAPF2)
//! ```
//!
//! The reflections write into the work area through a one-pole IIR:
//!
//! ```text
//! [mSAME] = (in + [dSAME] × vWALL − [mSAME − 1]) × vIIR + [mSAME − 1]
//! ```
//!
//! where `[x]` means "the sample at cursor + x". Because every address is
//! relative to a moving cursor, writing at `m` and later reading at a
//! smaller `m'` is a delay of `m − m'` ticks. The four comb taps pick up
//! those reflections at different delays and the two all-pass stages
//! smear them in time without colouring the spectrum.
//!
//! ## Addresses and Rate
//!
//! Preset registers are in the hardware's 8-byte units, i.e. four 16-bit
//! samples. They are scaled by `rate / 22050` so a model running at
//! another rate keeps the same delay *times*.
//!
//! The work area is a caller-provided float buffer. Its usable ring length
//! is the largest power of two that fits, so wrapping is a single mask.

use super::resampler::StereoProcessor;
use super::util::{ceil_pow2, clamp, floor_pow2};
use crate::error::{Error, Result};

/// The rate the reverb hardware ran at.
pub const REVERB_NATIVE_RATE: f32 = 22050.0;

/// Work-area footprint of the largest presets (Chaos Echo and Delay), in
/// samples.
const LONGEST_PRESET_SAMPLES: usize = 0x18040 / 2;

/// Samples per register address unit.
const SAMPLES_PER_UNIT: f32 = 4.0;

/// Number of `f32` samples a reverb workspace needs at `sample_rate` to
/// run any preset.
pub fn desired_buffer_len(sample_rate: f32) -> usize {
    scaled_len(LONGEST_PRESET_SAMPLES, sample_rate / REVERB_NATIVE_RATE)
}

fn scaled_len(samples: usize, ratio: f32) -> usize {
    ceil_pow2((samples as f32 * ratio).ceil() as usize)
}

/// The ten presets shipped with the console's SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReverbPreset {
    Off,
    Room,
    StudioSmall,
    StudioMedium,
    StudioLarge,
    #[default]
    Hall,
    HalfEcho,
    SpaceEcho,
    ChaosEcho,
    Delay,
}

impl ReverbPreset {
    pub const ALL: [ReverbPreset; 10] = [
        ReverbPreset::Off,
        ReverbPreset::Room,
        ReverbPreset::StudioSmall,
        ReverbPreset::StudioMedium,
        ReverbPreset::StudioLarge,
        ReverbPreset::Hall,
        ReverbPreset::HalfEcho,
        ReverbPreset::SpaceEcho,
        ReverbPreset::ChaosEcho,
        ReverbPreset::Delay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReverbPreset::Off => "Off",
            ReverbPreset::Room => "Room",
            ReverbPreset::StudioSmall => "Studio Small",
            ReverbPreset::StudioMedium => "Studio Medium",
            ReverbPreset::StudioLarge => "Studio Large",
            ReverbPreset::Hall => "Hall",
            ReverbPreset::HalfEcho => "Half Echo",
            ReverbPreset::SpaceEcho => "Space Echo",
            ReverbPreset::ChaosEcho => "Chaos Echo",
            ReverbPreset::Delay => "Delay",
        }
    }

    /// Size of the work area the preset reserves, in bytes at 22050 Hz.
    pub fn footprint_bytes(self) -> usize {
        match self {
            ReverbPreset::Off => 0x10,
            ReverbPreset::Room => 0x26C0,
            ReverbPreset::StudioSmall => 0x1F40,
            ReverbPreset::StudioMedium => 0x4840,
            ReverbPreset::StudioLarge => 0x6FE0,
            ReverbPreset::Hall => 0xADE0,
            ReverbPreset::HalfEcho => 0x3C00,
            ReverbPreset::SpaceEcho => 0xF6C0,
            ReverbPreset::ChaosEcho => 0x18040,
            ReverbPreset::Delay => 0x18040,
        }
    }

    fn registers(self) -> &'static Registers {
        match self {
            ReverbPreset::Off => &OFF,
            ReverbPreset::Room => &ROOM,
            ReverbPreset::StudioSmall => &STUDIO_SMALL,
            ReverbPreset::StudioMedium => &STUDIO_MEDIUM,
            ReverbPreset::StudioLarge => &STUDIO_LARGE,
            ReverbPreset::Hall => &HALL,
            ReverbPreset::HalfEcho => &HALF_ECHO,
            ReverbPreset::SpaceEcho => &SPACE_ECHO,
            ReverbPreset::ChaosEcho => &CHAOS_ECHO,
            ReverbPreset::Delay => &DELAY,
        }
    }
}

/// One preset's register block, in the hardware's register order.
///
/// Addresses (`d*`, `m*`) are in 8-byte units; volumes (`v*`) are signed
/// 16-bit fractions of 0x8000.
struct Registers([u16; 32]);

impl Registers {
    const D_APF1: usize = 0;
    const D_APF2: usize = 1;
    const V_IIR: usize = 2;
    const V_COMB1: usize = 3;
    const V_WALL: usize = 7;
    const V_APF1: usize = 8;
    const V_APF2: usize = 9;
    const M_SAME: usize = 10;
    const M_COMB1: usize = 12;
    const M_COMB2: usize = 14;
    const D_SAME: usize = 16;
    const M_DIFF: usize = 18;
    const M_COMB3: usize = 20;
    const M_COMB4: usize = 22;
    const D_DIFF: usize = 24;
    const M_APF1: usize = 26;
    const M_APF2: usize = 28;
    const V_IN: usize = 30;

    fn volume(&self, index: usize) -> f32 {
        self.0[index] as i16 as f32 / 32768.0
    }

    /// Left/right register pair starting at `index`.
    fn pair(&self, index: usize) -> [u16; 2] {
        [self.0[index], self.0[index + 1]]
    }
}

// Register data as published for the SDK presets, via ipatix's
// lv2-psx-reverb.

static OFF: Registers = Registers([
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0001, 0x0001, 0x0001, 0x0001, 0x0001, 0x0001,
    0x0000, 0x0000, 0x0001, 0x0001, 0x0001, 0x0001, 0x0001, 0x0001,
    0x0000, 0x0000, 0x0001, 0x0001, 0x0001, 0x0001, 0x0000, 0x0000,
]);

static ROOM: Registers = Registers([
    0x007D, 0x005B, 0x6D80, 0x54B8, 0xBED0, 0x0000, 0x0000, 0xBA80,
    0x5800, 0x5300, 0x04D6, 0x0333, 0x03F0, 0x0227, 0x0374, 0x01EF,
    0x0334, 0x01B5, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x01B4, 0x0136, 0x00B8, 0x005C, 0x8000, 0x8000,
]);

static STUDIO_SMALL: Registers = Registers([
    0x0033, 0x0025, 0x70F0, 0x4FA8, 0xBCE0, 0x4410, 0xC0F0, 0x9C00,
    0x5280, 0x4EC0, 0x03E4, 0x031B, 0x03A4, 0x02AF, 0x0372, 0x0266,
    0x031C, 0x025D, 0x025C, 0x018E, 0x022F, 0x0135, 0x01D2, 0x00B7,
    0x018F, 0x00B5, 0x00B4, 0x0080, 0x004C, 0x0026, 0x8000, 0x8000,
]);

static STUDIO_MEDIUM: Registers = Registers([
    0x00B1, 0x007F, 0x70F0, 0x4FA8, 0xBCE0, 0x4510, 0xBEF0, 0xB4C0,
    0x5280, 0x4EC0, 0x0904, 0x076B, 0x0824, 0x065F, 0x07A2, 0x0616,
    0x076C, 0x05ED, 0x05EC, 0x042E, 0x050F, 0x0305, 0x0462, 0x02B7,
    0x042F, 0x0265, 0x0264, 0x01B2, 0x0100, 0x0080, 0x8000, 0x8000,
]);

static STUDIO_LARGE: Registers = Registers([
    0x00E3, 0x00A9, 0x6F60, 0x4FA8, 0xBCE0, 0x4510, 0xBEF0, 0xA680,
    0x5680, 0x52C0, 0x0DFB, 0x0B58, 0x0D09, 0x0A3C, 0x0BD9, 0x0973,
    0x0B59, 0x08DA, 0x08D9, 0x05E9, 0x07EC, 0x04B0, 0x06EF, 0x03D2,
    0x05EA, 0x031D, 0x031C, 0x0238, 0x0154, 0x00AA, 0x8000, 0x8000,
]);

static HALL: Registers = Registers([
    0x01A5, 0x0139, 0x6000, 0x5000, 0x4C00, 0xB800, 0xBC00, 0xC000,
    0x6000, 0x5C00, 0x15BA, 0x11BB, 0x14C2, 0x10BD, 0x11BC, 0x0DC1,
    0x11C0, 0x0DC3, 0x0DC0, 0x09C1, 0x0BC4, 0x07C1, 0x0A00, 0x06CD,
    0x09C2, 0x05C1, 0x05C0, 0x041A, 0x0274, 0x013A, 0x8000, 0x8000,
]);

static HALF_ECHO: Registers = Registers([
    0x0017, 0x0013, 0x70F0, 0x4FA8, 0xBCE0, 0x4510, 0xBEF0, 0x8500,
    0x5F80, 0x54C0, 0x0371, 0x02AF, 0x02E5, 0x01DF, 0x02B0, 0x01D7,
    0x0358, 0x026A, 0x01D6, 0x011E, 0x012D, 0x00B1, 0x011F, 0x0059,
    0x01A0, 0x00E3, 0x0058, 0x0040, 0x0028, 0x0014, 0x8000, 0x8000,
]);

static SPACE_ECHO: Registers = Registers([
    0x033D, 0x0231, 0x7E00, 0x5000, 0xB400, 0xB000, 0x4C00, 0xB000,
    0x6000, 0x5400, 0x1ED6, 0x1A31, 0x1D14, 0x183B, 0x1BC2, 0x16B2,
    0x1A32, 0x15EF, 0x15EE, 0x1055, 0x1334, 0x0F2D, 0x11F6, 0x0C5D,
    0x1056, 0x0AE1, 0x0AE0, 0x07A2, 0x0464, 0x0232, 0x8000, 0x8000,
]);

static CHAOS_ECHO: Registers = Registers([
    0x0001, 0x0001, 0x7FFF, 0x7FFF, 0x0000, 0x0000, 0x0000, 0x8100,
    0x0000, 0x0000, 0x1FFF, 0x0FFF, 0x1005, 0x0005, 0x0000, 0x0000,
    0x1005, 0x0005, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x1004, 0x1002, 0x0004, 0x0002, 0x8000, 0x8000,
]);

static DELAY: Registers = Registers([
    0x0001, 0x0001, 0x7FFF, 0x7FFF, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x1FFF, 0x0FFF, 0x1005, 0x0005, 0x0000, 0x0000,
    0x1005, 0x0005, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x1004, 0x1002, 0x0004, 0x0002, 0x8000, 0x8000,
]);

/// A preset's registers converted for one sample rate: gains as floats,
/// addresses in samples. `[left, right]` pairs throughout.
#[derive(Debug, Clone, PartialEq)]
struct Taps {
    v_iir: f32,
    v_wall: f32,
    v_comb: [f32; 4],
    v_apf: [f32; 2],
    v_in: [f32; 2],

    d_apf: [usize; 2],
    m_same: [usize; 2],
    d_same: [usize; 2],
    m_diff: [usize; 2],
    d_diff: [usize; 2],
    m_comb: [[usize; 2]; 4],
    m_apf: [[usize; 2]; 2],
}

impl Taps {
    fn derive(registers: &Registers, ratio: f32) -> Self {
        let scale = |unit: u16| (unit as f32 * SAMPLES_PER_UNIT * ratio).round() as usize;
        let pair = |index: usize| registers.pair(index).map(scale);

        Taps {
            v_iir: registers.volume(Registers::V_IIR),
            v_wall: registers.volume(Registers::V_WALL),
            v_comb: [0, 1, 2, 3].map(|n| registers.volume(Registers::V_COMB1 + n)),
            v_apf: [
                registers.volume(Registers::V_APF1),
                registers.volume(Registers::V_APF2),
            ],
            v_in: [
                registers.volume(Registers::V_IN),
                registers.volume(Registers::V_IN + 1),
            ],
            d_apf: [
                scale(registers.0[Registers::D_APF1]),
                scale(registers.0[Registers::D_APF2]),
            ],
            m_same: pair(Registers::M_SAME),
            d_same: pair(Registers::D_SAME),
            m_diff: pair(Registers::M_DIFF),
            d_diff: pair(Registers::D_DIFF),
            m_comb: [
                pair(Registers::M_COMB1),
                pair(Registers::M_COMB2),
                pair(Registers::M_COMB3),
                pair(Registers::M_COMB4),
            ],
            m_apf: [pair(Registers::M_APF1), pair(Registers::M_APF2)],
        }
    }

    /// Every address the tick reads or writes, with its register name.
    fn addresses(&self) -> [(&'static str, usize); 22] {
        [
            ("dAPF1", self.d_apf[0]),
            ("dAPF2", self.d_apf[1]),
            ("mLSAME", self.m_same[0]),
            ("mRSAME", self.m_same[1]),
            ("dLSAME", self.d_same[0]),
            ("dRSAME", self.d_same[1]),
            ("mLDIFF", self.m_diff[0]),
            ("mRDIFF", self.m_diff[1]),
            ("dLDIFF", self.d_diff[0]),
            ("dRDIFF", self.d_diff[1]),
            ("mLCOMB1", self.m_comb[0][0]),
            ("mRCOMB1", self.m_comb[0][1]),
            ("mLCOMB2", self.m_comb[1][0]),
            ("mRCOMB2", self.m_comb[1][1]),
            ("mLCOMB3", self.m_comb[2][0]),
            ("mRCOMB3", self.m_comb[2][1]),
            ("mLCOMB4", self.m_comb[3][0]),
            ("mRCOMB4", self.m_comb[3][1]),
            ("mLAPF1", self.m_apf[0][0]),
            ("mRAPF1", self.m_apf[0][1]),
            ("mLAPF2", self.m_apf[1][0]),
            ("mRAPF2", self.m_apf[1][1]),
        ]
    }
}

/// User-facing reverb settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbConfig {
    /// Output volume, `[0, 1]`.
    pub output_level: f32,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self { output_level: 1.0 }
    }
}

impl ReverbConfig {
    pub fn combined(&self, modulation: &ReverbModulation) -> ReverbConfig {
        ReverbConfig {
            output_level: clamp(self.output_level + modulation.output_level, 0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReverbModulation {
    pub output_level: f32,
}

/// The reverb model, running over a caller-provided float workspace.
pub struct ReverbModel<B> {
    pub config: ReverbConfig,
    pub modulation: ReverbModulation,

    workspace: B,
    sample_rate: f32,
    preset: ReverbPreset,
    taps: Taps,

    /// Ring length minus one; the ring length is a power of two.
    mask: usize,

    /// Work-area origin, advancing one sample per tick.
    cursor: usize,
}

impl<B> ReverbModel<B>
where
    B: AsRef<[f32]> + AsMut<[f32]>,
{
    /// Build a model running `preset` at `sample_rate` over `workspace`.
    ///
    /// The workspace must hold at least [`desired_buffer_len`] samples for
    /// this rate, whichever preset is chosen, so any later
    /// [`set_preset`](Self::set_preset) fits without more memory.
    pub fn new(sample_rate: f32, mut workspace: B, preset: ReverbPreset) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::InvalidSampleRate(sample_rate));
        }

        let required = desired_buffer_len(sample_rate);
        let actual = workspace.as_ref().len();
        if actual < required {
            return Err(Error::ReverbWorkspaceTooSmall { required, actual });
        }

        let ring_len = floor_pow2(actual);
        let taps = validated_taps(preset.registers(), sample_rate, ring_len)?;

        workspace.as_mut()[..ring_len].fill(0.0);

        Ok(Self {
            config: ReverbConfig::default(),
            modulation: ReverbModulation::default(),
            workspace,
            sample_rate,
            preset,
            taps,
            mask: ring_len - 1,
            cursor: 0,
        })
    }

    /// Process one native-rate tick.
    ///
    /// # The Reverb Algorithm
    ///
    /// 1. **Scale** the input by the preset's input gains
    /// 2. **Reflect** it into the work area, same side then cross side
    /// 3. **Collect** four comb taps per channel
    /// 4. **Diffuse** the sum through two all-pass stages
    /// 5. **Advance** the cursor
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let level = self.config.combined(&self.modulation).output_level;
        let t = &self.taps;
        let mask = self.mask;
        let cursor = self.cursor;
        let at = |addr: usize| cursor.wrapping_add(addr) & mask;
        let ws = self.workspace.as_mut();

        // Step 1: SCALE the input.
        //
        // Every SDK preset uses 0x8000 here, a gain of -1, so the reverb
        // is phase-inverted relative to the dry signal.
        let input = [left * t.v_in[0], right * t.v_in[1]];

        // Step 2: REFLECT into the work area.
        //
        // Each reflection is a one-pole lowpass: the new value leans
        // toward the sample just behind it (`[m - 1]`) by `vIIR`. The
        // "wall" term feeds an older sample back in, which is what makes
        // the tail decay slowly instead of stopping after one pass.
        //
        // Same-side reflections.
        for c in 0..2 {
            let history = ws[at(t.m_same[c].wrapping_sub(1))];
            let wall = ws[at(t.d_same[c])] * t.v_wall;
            ws[at(t.m_same[c])] = saturate((input[c] + wall - history) * t.v_iir + history);
        }

        // Cross-side reflections: each channel hears the other's wall.
        for c in 0..2 {
            let history = ws[at(t.m_diff[c].wrapping_sub(1))];
            let wall = ws[at(t.d_diff[1 - c])] * t.v_wall;
            ws[at(t.m_diff[c])] = saturate((input[c] + wall - history) * t.v_iir + history);
        }

        let mut out = [0.0; 2];
        for (c, sample) in out.iter_mut().enumerate() {
            // Step 3: COLLECT the comb taps.
            //
            // Four reads at different distances behind the reflections,
            // weighted and summed. Their spacing sets the room's density.
            let mut acc: f32 = t
                .v_comb
                .iter()
                .zip(&t.m_comb)
                .map(|(gain, addr)| gain * ws[at(addr[c])])
                .sum();

            // Step 4: DIFFUSE through two all-pass stages.
            //
            // An all-pass passes every frequency at the same level but
            // smears it in time, turning discrete comb echoes into a wash.
            // Each stage stores its own intermediate value back into the
            // work area, `dAPF` samples ahead of where it reads.
            for stage in 0..2 {
                let addr = t.m_apf[stage][c];
                let gain = t.v_apf[stage];
                let delayed = ws[at(addr.wrapping_sub(t.d_apf[stage]))];
                acc -= gain * delayed;
                ws[at(addr)] = saturate(acc);
                acc = acc * gain + delayed;
            }

            *sample = saturate(acc) * level;
        }

        // Step 5: ADVANCE the cursor.
        //
        // Every address is relative to the cursor, so moving it by one
        // ages every stored sample by one tick without copying anything.
        self.cursor = (cursor + 1) & mask;
        (out[0], out[1])
    }

    /// Switch presets. Re-derives every address, checks it against the
    /// workspace and clears the workspace. On error the current preset is
    /// kept untouched.
    ///
    /// This touches the whole workspace, so call it between blocks rather
    /// than per sample.
    pub fn set_preset(&mut self, preset: ReverbPreset) -> Result<()> {
        self.taps = validated_taps(preset.registers(), self.sample_rate, self.mask + 1)?;
        self.preset = preset;
        self.clear_buffer();
        Ok(())
    }

    /// Zero the whole work area.
    pub fn clear_buffer(&mut self) {
        let ring_len = self.mask + 1;
        self.workspace.as_mut()[..ring_len].fill(0.0);
    }

    pub fn preset(&self) -> ReverbPreset {
        self.preset
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Usable ring length in samples.
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    pub fn into_inner(self) -> B {
        self.workspace
    }
}

impl<B> StereoProcessor for ReverbModel<B>
where
    B: AsRef<[f32]> + AsMut<[f32]>,
{
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        ReverbModel::process(self, left, right)
    }
}

/// Scale `registers` for `sample_rate` and check that every address
/// lands inside a ring of `ring_len` samples.
fn validated_taps(registers: &Registers, sample_rate: f32, ring_len: usize) -> Result<Taps> {
    let taps = Taps::derive(registers, sample_rate / REVERB_NATIVE_RATE);

    for (register, address) in taps.addresses() {
        if address >= ring_len {
            return Err(Error::AddressOutOfRange {
                register,
                address,
                len: ring_len,
            });
        }
    }

    Ok(taps)
}

/// Keep stored and emitted samples inside the 16-bit range the hardware
/// clamps to.
#[inline]
fn saturate(sample: f32) -> f32 {
    clamp(sample, -1.0, 1.0)
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
