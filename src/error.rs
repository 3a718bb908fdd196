//! Error types for the voxshift crate.

use thiserror::Error;

/// Errors that can occur while decoding, shifting, or encoding audio.
///
/// Every failure is terminal for the call that produced it: transforms are
/// deterministic, so retrying with the same input gives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PitchError {
    /// Non-finite or non-positive derived sample rate, malformed buffer
    /// dimensions, or an out-of-range configuration value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Preset name not present in the preset table.
    #[error("unknown preset: {0:?}")]
    UnknownPreset(String),
    /// Sample format or bit depth the crate does not handle.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Failure reported by an audio decoder collaborator.
    #[error("decode failed: {0}")]
    DecodeFailure(String),
    /// Failure reported by an audio encoder collaborator.
    #[error("encode failed: {0}")]
    EncodeFailure(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl PitchError {
    /// Short, stable name of the error kind, suitable for user-facing output.
    pub fn kind(&self) -> &'static str {
        match self {
            PitchError::InvalidParameter(_) => "InvalidParameter",
            PitchError::UnknownPreset(_) => "UnknownPreset",
            PitchError::UnsupportedFormat(_) => "UnsupportedFormat",
            PitchError::DecodeFailure(_) => "DecodeFailure",
            PitchError::EncodeFailure(_) => "EncodeFailure",
            PitchError::IoError(_) => "IoError",
        }
    }
}

impl From<std::io::Error> for PitchError {
    fn from(err: std::io::Error) -> Self {
        PitchError::IoError(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PitchError>;
