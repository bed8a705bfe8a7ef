//! # Console Echo Model
//!
//! A feedback echo in the style of a 16-bit game console's sound chip: a
//! mono 32 kHz delay line of signed 16-bit samples, an 8-tap FIR filter on
//! the delayed signal, and a feedback path back into the delay line.
//!
//! ```text
//! Input L ─┐
//!          ├─ avg ─► to i16 ─►(+)──► [Echo Buffer] ──► [FIR] ──┬──► L out
//! Input R ─┘                  ▲      (ring of `len`)           │
//!                             │                                ├──► −R out
//!                             └──────── × feedback ◄───────────┘
//! ```
//!
//! ## A Ring Whose Length Changes
//!
//! The ring buffer works exactly like a tape loop: a write head records at
//! `write_pos` and a read head trails behind it. What makes this model
//! different from a plain delay line is that the *loop length* is the
//! delay-time control. The buffer memory is fixed (240 ms at the native
//! rate) and only the modulus used for indexing changes.
//!
//! The hardware only latches a new echo length when the write head
//! reaches the end of the old buffer. We do the same: the requested length
//! is computed every tick, but it is committed only when `write_pos` wraps
//! to zero. Between two wrap points the length is stable no matter how
//! fast the control moves, which keeps the read head from jumping into
//! stale memory mid-loop.
//!
//! Lengths snap to 16 ms steps (512 samples at 32 kHz), again like the
//! hardware.

use super::fir::{blend_coefficients, FirCoefficients, FirFilter, FirPreset};
use super::resampler::StereoProcessor;
use super::util::{clamp, f32_to_i16, i16_to_f32, round_to, saturate_i16};
use crate::error::{Error, Result};

/// The rate the echo hardware ran at.
pub const ECHO_NATIVE_RATE: f32 = 32000.0;

/// Longest echo the buffer has to hold.
pub const MAX_ECHO_MS: f32 = 240.0;

/// Echo lengths snap to multiples of this.
pub const ECHO_INCREMENT_MS: f32 = 16.0;

/// Number of `i16` samples an echo buffer needs at `sample_rate`.
pub fn desired_buffer_len(sample_rate: f32) -> usize {
    (MAX_ECHO_MS * sample_rate / 1000.0).ceil() as usize
}

/// User-facing echo settings. Every field is normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoConfig {
    /// Echo length as a fraction of the maximum, snapped to 16 ms steps.
    pub buffer_size: f32,

    /// Read-head position within the current length. The delay is
    /// `delay_mod × length` samples; a zero offset reads one full length
    /// back, the same sample `1.0` reads.
    pub delay_mod: f32,

    /// Feedback gain. `1.0` never decays, so watch out.
    pub feedback: f32,

    /// Blend from the pass-through FIR response (`0.0`) to the target
    /// response (`1.0`).
    pub filter: f32,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1.0,
            delay_mod: 1.0,
            feedback: 0.0,
            filter: 0.0,
        }
    }
}

impl EchoConfig {
    /// The parameters a tick actually uses: `config + modulation`, each
    /// clamped to `[0, 1]`.
    pub fn combined(&self, modulation: &EchoModulation) -> EchoConfig {
        EchoConfig {
            buffer_size: clamp(self.buffer_size + modulation.buffer_size, 0.0, 1.0),
            delay_mod: clamp(self.delay_mod + modulation.delay_mod, 0.0, 1.0),
            feedback: clamp(self.feedback + modulation.feedback, 0.0, 1.0),
            filter: clamp(self.filter + modulation.filter, 0.0, 1.0),
        }
    }
}

/// Transient offsets added to [`EchoConfig`], e.g. from a CV input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EchoModulation {
    pub buffer_size: f32,
    pub delay_mod: f32,
    pub feedback: f32,
    pub filter: f32,
}

/// The echo model, running over caller-provided sample storage.
///
/// `B` is anything that derefs to a slice of `i16`: a `&'static mut [i16]`
/// on an embedded target, or a `Box<[i16]>` allocated once by a plugin
/// host. The model never grows, shrinks or reallocates it.
pub struct EchoModel<B> {
    pub config: EchoConfig,
    pub modulation: EchoModulation,

    buffer: B,
    sample_rate: f32,

    /// Longest ring length, i.e. the portion of `buffer` in use.
    max_len: usize,

    /// Length step in samples.
    increment: f32,

    /// Committed ring length. Only changes when `write_pos` is zero.
    len: usize,

    write_pos: usize,

    fir: FirFilter,

    /// Response reached at `filter = 1.0`.
    fir_target: FirCoefficients,
}

impl<B> EchoModel<B>
where
    B: AsRef<[i16]> + AsMut<[i16]>,
{
    /// Build a model running at `sample_rate` over `buffer`.
    ///
    /// The buffer must hold at least [`desired_buffer_len`] samples for
    /// this rate. Any extra capacity is left untouched.
    pub fn new(sample_rate: f32, mut buffer: B) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::InvalidSampleRate(sample_rate));
        }

        let increment = (ECHO_INCREMENT_MS * sample_rate / 1000.0).round();
        if increment < 1.0 {
            return Err(Error::InvalidSampleRate(sample_rate));
        }

        let required = desired_buffer_len(sample_rate);
        let actual = buffer.as_ref().len();
        if actual < required {
            return Err(Error::EchoBufferTooSmall { required, actual });
        }

        buffer.as_mut()[..required].fill(0);

        Ok(Self {
            config: EchoConfig::default(),
            modulation: EchoModulation::default(),
            buffer,
            sample_rate,
            max_len: required,
            increment,
            len: required,
            write_pos: 0,
            fir: FirFilter::new(),
            fir_target: FirPreset::Highpass.coefficients(),
        })
    }

    /// Process one native-rate tick.
    ///
    /// Returns the filtered echo on the left and its negation on the
    /// right. Callers that want a non-inverted image flip the right
    /// channel back themselves.
    ///
    /// # The Echo Algorithm
    ///
    /// 1. **Resolve** the effective parameters (config + modulation)
    /// 2. **Advance** the write head, latching a new length at the wrap
    /// 3. **Quantize** the mono input to 16 bits
    /// 4. **Read** the delayed sample behind the write head
    /// 5. **Filter** it through the 8-tap FIR
    /// 6. **Write** input + scaled feedback back into the loop
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        // Step 1: RESOLVE this tick's parameters.
        //
        // Modulation is added on top of the user's settings and the sum
        // is clamped, so a CV input can push a knob to its end stop but
        // never past it.
        let params = self.config.combined(&self.modulation);

        let target_len = self.target_len(params.buffer_size);

        // Step 2: ADVANCE the write head.
        //
        // The requested length is only latched when the head wraps to
        // zero. Until then the old length stays in force, so a knob sweep
        // is heard as one clean jump per loop:
        //
        //   len = 7680, size → 0.5
        //   ... write_pos 7678, 7679, 0 ← new len (4096) latched here
        self.write_pos = (self.write_pos + 1) % self.len;
        if target_len != self.len && self.write_pos == 0 {
            self.len = target_len;
        }

        // Step 3: QUANTIZE the input.
        //
        // The hardware echo is mono and 16-bit. Summing the two inputs
        // and halving keeps a mono source (left == right) at unity.
        let input = f32_to_i16((left + right) * 0.5);

        // Step 4: READ the delayed sample.
        //
        // The read head trails the write head by `delay_mod × len`
        // samples. An offset of zero wraps to a full loop, so the read
        // head never lands on the sample about to be overwritten.
        let offset = (params.delay_mod * self.len as f32) as usize % self.len;
        let read_pos = (self.write_pos + self.len - offset) % self.len;

        let buffer = self.buffer.as_mut();
        let delayed = buffer[read_pos];

        // Step 5: FILTER the delayed sample.
        //
        // The `filter` control morphs every tap from the flat response
        // toward the target. The FIR sits inside the feedback loop, so
        // each repeat passes through it once more than the last.
        let coefficients = blend_coefficients(
            &FirPreset::PassThrough.coefficients(),
            &self.fir_target,
            params.filter,
        );
        let filtered = self.fir.process(delayed, &coefficients);

        // Step 6: WRITE input + feedback into the loop.
        //
        // The sum saturates at the 16-bit limits instead of wrapping, so
        // runaway feedback clips rather than flipping sign.
        let feedback = (filtered as f32 * params.feedback) as i32;
        buffer[self.write_pos] = saturate_i16(input as i32 + feedback);

        let echo = i16_to_f32(filtered);
        (echo, -echo)
    }

    /// Zero the echo memory and the FIR history.
    ///
    /// The write position and committed length are kept, so this is safe
    /// to call between any two ticks.
    pub fn clear_buffer(&mut self) {
        self.buffer.as_mut()[..self.max_len].fill(0);
        self.fir.reset();
    }

    /// Replace the response reached at `filter = 1.0`.
    pub fn set_fir_coefficients(&mut self, coefficients: FirCoefficients) {
        self.fir_target = coefficients;
    }

    pub fn fir_coefficients(&self) -> FirCoefficients {
        self.fir_target
    }

    /// Ring length for a normalized size, snapped and kept non-zero.
    fn target_len(&self, size: f32) -> usize {
        let snapped = round_to(size * self.max_len as f32, self.increment) as usize;
        snapped.clamp(1, self.max_len)
    }

    /// Committed ring length in samples.
    pub fn effective_len(&self) -> usize {
        self.len
    }

    pub fn write_index(&self) -> usize {
        self.write_pos
    }

    /// Longest possible ring length in samples.
    pub fn capacity(&self) -> usize {
        self.max_len
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn buffer(&self) -> &[i16] {
        &self.buffer.as_ref()[..self.max_len]
    }

    /// Give the storage back to the caller.
    pub fn into_inner(self) -> B {
        self.buffer
    }
}

impl<B> StereoProcessor for EchoModel<B>
where
    B: AsRef<[i16]> + AsMut<[i16]>,
{
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        EchoModel::process(self, left, right)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
