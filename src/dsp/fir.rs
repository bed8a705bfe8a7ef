//! # 8-Tap Fixed-Point FIR Filter
//!
//! The echo hardware runs every delayed sample through an 8-tap FIR
//! (Finite Impulse Response) filter before it is fed back. Unlike the
//! one-pole IIR filter a plain digital delay might use, an FIR filter only
//! looks at past *inputs*:
//!
//! ```text
//! y[n] = c0*x[n] + c1*x[n-1] + ... + c7*x[n-7]
//! ```
//!
//! Coefficients are signed 8-bit values and every product is scaled down
//! by 2^7, so `0x7F` is a gain of 127/128 (the hardware's "unity").
//!
//! ## The 16-bit Wrap
//!
//! The hardware sums the seven older taps in a 16-bit register that wraps
//! silently, then adds the newest tap and clamps the result. With extreme
//! coefficients this produces a characteristic crackle that games relied
//! on, so the wrap is reproduced exactly in one place,
//! [`FirFilter::process`], and everything after it saturates.

pub const FIR_TAPS: usize = 8;

/// Right shift applied to every coefficient × sample product.
const PRODUCT_SHIFT: u32 = 7;

pub type FirCoefficients = [i8; FIR_TAPS];

/// Common responses. Tap 0 weights the newest sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirPreset {
    /// `0x7F` on the newest tap only.
    PassThrough,
    /// Darkens each repeat.
    Lowpass,
    /// Thins each repeat out.
    Highpass,
    /// Narrow, telephone-like repeats.
    BandPass,
}

impl FirPreset {
    pub fn coefficients(self) -> FirCoefficients {
        match self {
            FirPreset::PassThrough => [0x7F, 0, 0, 0, 0, 0, 0, 0],
            FirPreset::Lowpass => [
                0x0C, 0x21, 0x2B, 0x2B, 0x13, 0xFEu8 as i8, 0xF3u8 as i8, 0xF9u8 as i8,
            ],
            FirPreset::Highpass => [
                0x58, 0xBFu8 as i8, 0xDBu8 as i8, 0xF0u8 as i8, 0xFEu8 as i8, 0x07, 0x0C, 0x0C,
            ],
            FirPreset::BandPass => [
                0x34, 0x33, 0x00, 0xD9u8 as i8, 0xE5u8 as i8, 0x01, 0xFCu8 as i8, 0xEBu8 as i8,
            ],
        }
    }
}

/// Blend two coefficient sets tap by tap, rounding to the nearest integer.
///
/// `amount` must already be clamped to `[0, 1]`; the result then always
/// stays between the two endpoint taps, so it fits in an `i8`.
pub fn blend_coefficients(
    from: &FirCoefficients,
    to: &FirCoefficients,
    amount: f32,
) -> FirCoefficients {
    let mut out = [0; FIR_TAPS];
    for ((o, &a), &b) in out.iter_mut().zip(from).zip(to) {
        let blended = a as f32 + (b as f32 - a as f32) * amount;
        *o = blended.round() as i8;
    }
    out
}

/// The filter's sample history. Coefficients are passed per call because
/// the echo model re-blends them from its filter parameter every tick.
pub struct FirFilter {
    /// `history[0]` is the newest sample, `history[7]` the oldest.
    history: [i16; FIR_TAPS],
}

impl FirFilter {
    pub fn new() -> Self {
        Self {
            history: [0; FIR_TAPS],
        }
    }

    /// Push one sample and return the filtered output.
    pub fn process(&mut self, sample: i16, coefficients: &FirCoefficients) -> i16 {
        self.history.copy_within(0..FIR_TAPS - 1, 1);
        self.history[0] = sample;

        let tap = |i: usize| (coefficients[i] as i32 * self.history[i] as i32) >> PRODUCT_SHIFT;

        // Oldest seven taps, in a register that wraps at 16 bits.
        let mut sum: i32 = 0;
        for i in (1..FIR_TAPS).rev() {
            sum += tap(i);
        }
        let sum = sum as i16 as i32;

        // Newest tap, then clamp.
        (sum + tap(0)).clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }

    pub fn reset(&mut self) {
        self.history = [0; FIR_TAPS];
    }
}

impl Default for FirFilter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
