use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PitchError;

/// Number of semitones in an octave.
pub const SEMITONES_PER_OCTAVE: f64 = 12.0;

/// Number of cents in a semitone.
pub const CENTS_PER_SEMITONE: f64 = 100.0;

/// Frequency ratio for a signed semitone offset: `2^(semitones / 12)`.
#[inline]
pub fn semitone_ratio(semitones: f64) -> f64 {
    (semitones / SEMITONES_PER_OCTAVE).exp2()
}

/// Converts cents to semitones (100 cents = 1 semitone).
#[inline]
pub fn cents_to_semitones(cents: f64) -> f64 {
    cents / CENTS_PER_SEMITONE
}

/// Storage format of the samples in a [`SampleBuffer`](crate::SampleBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    Int16,
    Int32,
    Float32,
}

impl SampleFormat {
    /// Bits per sample.
    pub fn bits_per_sample(self) -> u16 {
        match self {
            SampleFormat::Int16 => 16,
            SampleFormat::Int32 | SampleFormat::Float32 => 32,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleFormat::Int16 => write!(f, "int16"),
            SampleFormat::Int32 => write!(f, "int32"),
            SampleFormat::Float32 => write!(f, "float32"),
        }
    }
}

impl FromStr for SampleFormat {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int16" | "i16" | "s16" => Ok(SampleFormat::Int16),
            "int32" | "i32" | "s32" => Ok(SampleFormat::Int32),
            "float32" | "f32" => Ok(SampleFormat::Float32),
            other => Err(PitchError::UnsupportedFormat(format!(
                "sample format '{}' (expected int16, int32 or float32)",
                other
            ))),
        }
    }
}

/// Pitch-shifting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Relabel the sample rate and resample back to the target rate.
    /// Changes pitch and duration together.
    #[default]
    Resample,
    /// Short-time Fourier analysis and resynthesis. Preserves duration.
    PhaseVocoder,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Resample => write!(f, "resample"),
            Strategy::PhaseVocoder => write!(f, "phase-vocoder"),
        }
    }
}

impl FromStr for Strategy {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "resample" | "resampling" => Ok(Strategy::Resample),
            "phase-vocoder" | "vocoder" | "pv" => Ok(Strategy::PhaseVocoder),
            other => Err(PitchError::InvalidParameter(format!(
                "unknown strategy '{}' (expected resample or phase-vocoder)",
                other
            ))),
        }
    }
}

/// A fully resolved pitch-shift request.
///
/// Built by the orchestrator from a preset lookup; immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchShiftRequest {
    semitones: f64,
    strategy: Strategy,
    target_sample_rate: u32,
}

impl PitchShiftRequest {
    /// Creates a request.
    ///
    /// # Errors
    /// Returns [`PitchError::InvalidParameter`] if `semitones` is not finite
    /// or `target_sample_rate` is zero.
    pub fn new(
        semitones: f64,
        strategy: Strategy,
        target_sample_rate: u32,
    ) -> Result<Self, PitchError> {
        if !semitones.is_finite() {
            return Err(PitchError::InvalidParameter(format!(
                "semitone offset must be finite, got {}",
                semitones
            )));
        }
        if target_sample_rate == 0 {
            return Err(PitchError::InvalidParameter(
                "target sample rate must be positive".to_string(),
            ));
        }
        Ok(Self {
            semitones,
            strategy,
            target_sample_rate,
        })
    }

    #[inline]
    pub fn semitones(&self) -> f64 {
        self.semitones
    }

    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    #[inline]
    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Frequency ratio applied by this request.
    #[inline]
    pub fn pitch_ratio(&self) -> f64 {
        semitone_ratio(self.semitones)
    }
}
