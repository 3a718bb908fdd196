//! Pitch shifting by sample-rate relabelling.
//!
//! The samples are declared to have been recorded at
//! `rate * 2^(semitones / 12)` and then converted back to the target rate.
//! Pitch and duration change together: the output lasts
//! `duration / 2^(semitones / 12)` seconds.

use tracing::debug;

use crate::core::{semitone_ratio, Interpolation, SampleBuffer, Strategy};
use crate::error::PitchError;
use crate::normalize::convert_rate;
use crate::shift::{validate_semitones, PitchShifter};

/// Default output rate after relabelling.
pub const DEFAULT_TARGET_SAMPLE_RATE: u32 = 44_100;

/// Cheap pitch shifter that trades duration for pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResamplingShifter {
    target_sample_rate: u32,
    interpolation: Interpolation,
}

impl Default for ResamplingShifter {
    fn default() -> Self {
        Self {
            target_sample_rate: DEFAULT_TARGET_SAMPLE_RATE,
            interpolation: Interpolation::default(),
        }
    }
}

impl ResamplingShifter {
    /// Creates a shifter converting to `target_sample_rate`.
    ///
    /// # Errors
    /// Returns [`PitchError::InvalidParameter`] if the rate is zero.
    pub fn new(target_sample_rate: u32, interpolation: Interpolation) -> Result<Self, PitchError> {
        if target_sample_rate == 0 {
            return Err(PitchError::InvalidParameter(
                "target sample rate must be positive".to_string(),
            ));
        }
        Ok(Self {
            target_sample_rate,
            interpolation,
        })
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }
}

/// Sample rate at which `sample_rate` audio must be played to sound
/// `semitones` higher.
///
/// # Errors
/// Returns [`PitchError::InvalidParameter`] if the result is non-finite,
/// below 1 Hz, or does not fit in a `u32`.
pub fn relabelled_rate(sample_rate: u32, semitones: f64) -> Result<u32, PitchError> {
    let rate = (sample_rate as f64 * semitone_ratio(semitones)).round();
    if !rate.is_finite() || rate < 1.0 || rate > u32::MAX as f64 {
        return Err(PitchError::InvalidParameter(format!(
            "shifting {} Hz by {} semitones gives unusable sample rate {}",
            sample_rate, semitones, rate
        )));
    }
    Ok(rate as u32)
}

impl PitchShifter for ResamplingShifter {
    fn strategy(&self) -> Strategy {
        Strategy::Resample
    }

    fn shift(&self, buffer: &SampleBuffer, semitones: f64) -> Result<SampleBuffer, PitchError> {
        validate_semitones(semitones)?;
        if semitones == 0.0 {
            return Ok(buffer.clone());
        }

        let new_rate = relabelled_rate(buffer.sample_rate(), semitones)?;
        debug!(
            semitones,
            source_rate = buffer.sample_rate(),
            relabelled_rate = new_rate,
            target_rate = self.target_sample_rate,
            "relabelling sample rate"
        );

        let relabelled = buffer.with_sample_rate(new_rate)?;
        if new_rate == self.target_sample_rate {
            return Ok(relabelled);
        }
        convert_rate(&relabelled, self.target_sample_rate, self.interpolation)
    }
}
