//! # DSP (Digital Signal Processing) Core
//!
//! Everything in here runs on the audio thread, one sample at a time, in
//! bounded time and without allocating:
//!
//! - **`util`**: clamp, lerp, equal-power crossfade, fixed-point
//!   conversions.
//! - **`resampler`**: runs a model at its own native rate underneath any
//!   host rate.
//! - **`fir`**: the echo's 8-tap fixed-point feedback filter.
//! - **`echo`**: the 16-bit console echo (32 kHz ring buffer + FIR +
//!   feedback).
//! - **`reverb`**: the 32-bit console reverb (comb and all-pass network in a
//!   shared work area, 22.05 kHz).
//! - **`mixer`**: echo/reverb crossfade and wet/dry blend.
//! - **`chain`**: one frame through all of the above.

pub mod chain;
pub mod echo;
pub mod fir;
pub mod mixer;
pub mod resampler;
pub mod reverb;
pub mod util;
