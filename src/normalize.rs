//! Output format normalization.
//!
//! Runs after every shift so the encoder always receives the canonical
//! sample rate (and, when configured, the canonical sample format).

use tracing::debug;

use crate::core::resample::converted_len;
use crate::core::{Interpolation, SampleBuffer, SampleFormat};
use crate::error::PitchError;
use crate::shift::build_output;

/// Converts a buffer to a different sample rate, keeping its channel count
/// and sample format. Duration is preserved; pitch is unchanged relative to
/// the buffer's own rate label.
pub fn convert_rate(
    buffer: &SampleBuffer,
    target_rate: u32,
    interpolation: Interpolation,
) -> Result<SampleBuffer, PitchError> {
    convert(buffer, target_rate, buffer.sample_format(), interpolation)
}

fn convert(
    buffer: &SampleBuffer,
    target_rate: u32,
    format: SampleFormat,
    interpolation: Interpolation,
) -> Result<SampleBuffer, PitchError> {
    if target_rate == 0 {
        return Err(PitchError::InvalidParameter(
            "target sample rate must be positive".to_string(),
        ));
    }
    let output_frames = converted_len(buffer.frame_count(), buffer.sample_rate(), target_rate);
    debug!(
        from_rate = buffer.sample_rate(),
        to_rate = target_rate,
        input_frames = buffer.frame_count(),
        output_frames,
        ?interpolation,
        "converting sample rate"
    );

    let planes: Vec<Vec<f32>> = if target_rate == buffer.sample_rate() {
        buffer.to_planar_f32()
    } else {
        buffer
            .to_planar_f32()
            .iter()
            .map(|ch| interpolation.resample(ch, output_frames))
            .collect()
    };
    build_output(&planes, target_rate, format, "normalize")
}

/// Brings processed buffers to a canonical output rate and format.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FormatNormalizer {
    interpolation: Interpolation,
    output_format: Option<SampleFormat>,
}

impl FormatNormalizer {
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            interpolation,
            output_format: None,
        }
    }

    /// Forces every normalized buffer into `format`.
    pub fn with_output_format(mut self, format: Option<SampleFormat>) -> Self {
        self.output_format = format;
        self
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn output_format(&self) -> Option<SampleFormat> {
        self.output_format
    }

    /// Resamples `buffer` to `target_rate` if its rate differs; otherwise the
    /// buffer is handed back as is.
    ///
    /// # Errors
    /// Returns [`PitchError::InvalidParameter`] if `target_rate` is zero.
    pub fn normalize(
        &self,
        buffer: SampleBuffer,
        target_rate: u32,
    ) -> Result<SampleBuffer, PitchError> {
        let format = self.output_format.unwrap_or(buffer.sample_format());
        self.normalize_to(buffer, target_rate, format)
    }

    /// Like [`normalize`](Self::normalize), but also converts the sample
    /// format, clamping values to the target format's range.
    pub fn normalize_to(
        &self,
        buffer: SampleBuffer,
        target_rate: u32,
        format: SampleFormat,
    ) -> Result<SampleBuffer, PitchError> {
        if target_rate == 0 {
            return Err(PitchError::InvalidParameter(
                "target sample rate must be positive".to_string(),
            ));
        }
        if buffer.sample_rate() == target_rate && buffer.sample_format() == format {
            return Ok(buffer);
        }
        convert(&buffer, target_rate, format, self.interpolation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleData;

    fn sine_buffer(freq: f32, rate: u32, frames: usize, channels: u16) -> SampleBuffer {
        let data: Vec<f32> = (0..frames)
            .flat_map(|i| {
                let s = 0.5 * (std::f32::consts::TAU * freq * i as f32 / rate as f32).sin();
                std::iter::repeat(s).take(channels as usize)
            })
            .collect();
        SampleBuffer::from_f32(channels, rate, data).unwrap()
    }

    #[test]
    fn test_normalize_same_rate_is_passthrough() {
        let buffer = sine_buffer(440.0, 44100, 1000, 1);
        let expected = buffer.clone();
        let out = FormatNormalizer::default().normalize(buffer, 44100).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_normalize_resamples_to_target() {
        let buffer = sine_buffer(440.0, 48000, 48000, 2);
        let out = FormatNormalizer::default().normalize(buffer, 44100).unwrap();
        assert_eq!(out.sample_rate(), 44100);
        assert_eq!(out.channels(), 2);
        assert_eq!(out.frame_count(), 44100);
        assert!((out.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_rate_rejected() {
        let buffer = sine_buffer(440.0, 44100, 10, 1);
        assert!(matches!(
            FormatNormalizer::default().normalize(buffer, 0),
            Err(PitchError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_normalize_to_format_clamps() {
        let buffer = SampleBuffer::from_f32(1, 44100, vec![0.5, 1.5, -1.5]).unwrap();
        let out = FormatNormalizer::default()
            .normalize_to(buffer, 44100, SampleFormat::Int16)
            .unwrap();
        assert_eq!(out.samples(), &SampleData::I16(vec![16384, i16::MAX, i16::MIN]));
    }

    #[test]
    fn test_output_format_override() {
        let buffer = SampleBuffer::from_i16(1, 22050, vec![0, 8192, -8192, 0]).unwrap();
        let normalizer =
            FormatNormalizer::new(Interpolation::Linear).with_output_format(Some(SampleFormat::Float32));
        let out = normalizer.normalize(buffer, 22050).unwrap();
        assert_eq!(out.samples(), &SampleData::F32(vec![0.0, 0.25, -0.25, 0.0]));
    }

    #[test]
    fn test_convert_rate_empty_buffer() {
        let buffer = SampleBuffer::from_f32(2, 48000, vec![]).unwrap();
        let out = convert_rate(&buffer, 44100, Interpolation::Cubic).unwrap();
        assert_eq!(out.frame_count(), 0);
        assert_eq!(out.sample_rate(), 44100);
        assert_eq!(out.channels(), 2);
    }
}
