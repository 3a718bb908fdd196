//! Pitch-shifting strategies.
//!
//! Both strategies implement [`PitchShifter`]: they borrow the input buffer
//! and return a freshly built one, so a failed shift never leaves a partially
//! transformed buffer behind.

pub mod phase_vocoder;
pub mod resampling;

pub use phase_vocoder::PhaseVocoderShifter;
pub use resampling::ResamplingShifter;

use tracing::warn;

use crate::core::{SampleBuffer, SampleFormat, Strategy};
use crate::error::PitchError;

/// A pitch-shifting strategy.
pub trait PitchShifter {
    /// The strategy this shifter implements.
    fn strategy(&self) -> Strategy;

    /// Shifts `buffer` by `semitones` (positive = higher pitch).
    ///
    /// # Errors
    /// Returns [`PitchError::InvalidParameter`] for non-finite offsets or
    /// offsets whose derived sample rate is not representable.
    fn shift(&self, buffer: &SampleBuffer, semitones: f64) -> Result<SampleBuffer, PitchError>;
}

/// Rejects non-finite semitone offsets.
#[inline]
pub(crate) fn validate_semitones(semitones: f64) -> Result<(), PitchError> {
    if !semitones.is_finite() {
        return Err(PitchError::InvalidParameter(format!(
            "semitone offset must be finite, got {}",
            semitones
        )));
    }
    Ok(())
}

/// Builds the output buffer of a processing stage from float planes,
/// reporting any samples clipped on the way back to `format`.
pub(crate) fn build_output(
    planes: &[Vec<f32>],
    sample_rate: u32,
    format: SampleFormat,
    stage: &str,
) -> Result<SampleBuffer, PitchError> {
    let (buffer, clipped) = SampleBuffer::from_planar_f32(planes, sample_rate, format)?;
    if clipped > 0 {
        warn!(
            stage,
            clipped,
            format = %format,
            "samples clipped to the representable range"
        );
    }
    Ok(buffer)
}

/// Minimum RMS threshold to avoid division by zero during normalization.
const NORMALIZE_RMS_FLOOR: f32 = 1e-8;

/// Computes the RMS (root mean square) of a signal.
#[inline]
pub(crate) fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Scales output so its RMS matches `target_rms`, if both have sufficient energy.
#[inline]
pub(crate) fn normalize_rms(output: &mut [f32], target_rms: f32) {
    let output_rms = compute_rms(output);
    if output_rms < NORMALIZE_RMS_FLOOR || target_rms < NORMALIZE_RMS_FLOOR {
        return;
    }
    let gain = target_rms / output_rms;
    for s in output.iter_mut() {
        *s *= gain;
    }
}
