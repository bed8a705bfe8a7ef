//! # Construction-Time Errors
//!
//! The per-sample path has no failure modes: out-of-range parameters are
//! clamped and fixed-point overflow saturates. The only way to misuse the
//! core is to hand a model the wrong amount of memory or a nonsensical
//! sample rate, and that is caught once, when the model is built.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The echo buffer cannot hold the maximum echo depth at this rate.
    #[error("echo buffer holds {actual} samples but {required} are required")]
    EchoBufferTooSmall { required: usize, actual: usize },

    /// The reverb workspace cannot hold the longest preset's footprint at
    /// this rate.
    #[error("reverb workspace holds {actual} samples but {required} are required")]
    ReverbWorkspaceTooSmall { required: usize, actual: usize },

    /// A scaled reverb register points outside the workspace ring.
    #[error("reverb register {register} scales to address {address}, outside a ring of {len}")]
    AddressOutOfRange {
        register: &'static str,
        address: usize,
        len: usize,
    },

    #[error("sample rate {0} Hz is not usable")]
    InvalidSampleRate(f32),
}

pub type Result<T> = std::result::Result<T, Error>;
