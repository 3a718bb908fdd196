//! Decoded audio held in memory.

use crate::core::types::SampleFormat;
use crate::error::PitchError;

/// Full-scale divisor for 16-bit integer samples.
const I16_SCALE: f32 = 32_768.0;
/// Full-scale divisor for 32-bit integer samples.
const I32_SCALE: f64 = 2_147_483_648.0;

/// Interleaved sample storage, tagged with its format.
///
/// For mono audio samples are sequential: `[s0, s1, s2, ...]`.
/// For stereo audio they are interleaved: `[L0, R0, L1, R1, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
}

impl SampleData {
    /// Total number of samples across all channels.
    pub fn len(&self) -> usize {
        match self {
            SampleData::I16(v) => v.len(),
            SampleData::I32(v) => v.len(),
            SampleData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> SampleFormat {
        match self {
            SampleData::I16(_) => SampleFormat::Int16,
            SampleData::I32(_) => SampleFormat::Int32,
            SampleData::F32(_) => SampleFormat::Float32,
        }
    }

    /// Sample at `index` as a float in `[-1.0, 1.0]`.
    #[inline]
    fn get_f32(&self, index: usize) -> f32 {
        match self {
            SampleData::I16(v) => v[index] as f32 / I16_SCALE,
            SampleData::I32(v) => (v[index] as f64 / I32_SCALE) as f32,
            SampleData::F32(v) => v[index],
        }
    }

    /// Converts floats into the requested format, clamping to the representable
    /// range. Returns the data and the number of samples that had to be clipped.
    pub fn from_f32(samples: &[f32], format: SampleFormat) -> (Self, usize) {
        let mut clipped = 0usize;
        let data = match format {
            SampleFormat::Int16 => SampleData::I16(
                samples
                    .iter()
                    .map(|&s| {
                        let scaled = (s * I16_SCALE).round();
                        if !(i16::MIN as f32..=i16::MAX as f32).contains(&scaled) {
                            clipped += 1;
                        }
                        scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
                    })
                    .collect(),
            ),
            SampleFormat::Int32 => SampleData::I32(
                samples
                    .iter()
                    .map(|&s| {
                        let scaled = (s as f64 * I32_SCALE).round();
                        if !(i32::MIN as f64..=i32::MAX as f64).contains(&scaled) {
                            clipped += 1;
                        }
                        scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i32
                    })
                    .collect(),
            ),
            SampleFormat::Float32 => SampleData::F32(
                samples
                    .iter()
                    .map(|&s| {
                        if !(-1.0..=1.0).contains(&s) {
                            clipped += 1;
                        }
                        s.clamp(-1.0, 1.0)
                    })
                    .collect(),
            ),
        };
        (data, clipped)
    }
}

/// Decoded, uniformly sampled audio.
///
/// A buffer is never mutated by a transform: every stage builds a new one.
/// The fields are private so that `samples.len() == frame_count * channels`
/// holds for every buffer in existence.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: u16,
    sample_rate: u32,
    data: SampleData,
}

impl SampleBuffer {
    /// Creates a new sample buffer.
    ///
    /// # Errors
    /// Returns [`PitchError::InvalidParameter`] if `channels` or `sample_rate`
    /// is zero, if the sample count is not a multiple of the channel count, or
    /// if float data holds NaN or infinite samples.
    pub fn new(channels: u16, sample_rate: u32, data: SampleData) -> Result<Self, PitchError> {
        if channels == 0 {
            return Err(PitchError::InvalidParameter(
                "channel count must be positive".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(PitchError::InvalidParameter(
                "sample rate must be positive".to_string(),
            ));
        }
        if data.len() % channels as usize != 0 {
            return Err(PitchError::InvalidParameter(format!(
                "{} samples cannot be split into {} channels",
                data.len(),
                channels
            )));
        }
        if let SampleData::F32(samples) = &data {
            if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
                return Err(PitchError::InvalidParameter(format!(
                    "non-finite sample {} at index {}",
                    samples[index], index
                )));
            }
        }
        Ok(Self {
            channels,
            sample_rate,
            data,
        })
    }

    /// Creates a float buffer from interleaved samples.
    pub fn from_f32(channels: u16, sample_rate: u32, samples: Vec<f32>) -> Result<Self, PitchError> {
        Self::new(channels, sample_rate, SampleData::F32(samples))
    }

    /// Creates a 16-bit integer buffer from interleaved samples.
    pub fn from_i16(channels: u16, sample_rate: u32, samples: Vec<i16>) -> Result<Self, PitchError> {
        Self::new(channels, sample_rate, SampleData::I16(samples))
    }

    /// Creates a 32-bit integer buffer from interleaved samples.
    pub fn from_i32(channels: u16, sample_rate: u32, samples: Vec<i32>) -> Result<Self, PitchError> {
        Self::new(channels, sample_rate, SampleData::I32(samples))
    }

    /// Creates a buffer of `frames` frames of silence.
    pub fn silence(
        channels: u16,
        sample_rate: u32,
        frames: usize,
        format: SampleFormat,
    ) -> Result<Self, PitchError> {
        let len = frames.checked_mul(channels as usize).ok_or_else(|| {
            PitchError::InvalidParameter(format!(
                "{} frames of {} channels overflow the sample count",
                frames, channels
            ))
        })?;
        let data = match format {
            SampleFormat::Int16 => SampleData::I16(vec![0; len]),
            SampleFormat::Int32 => SampleData::I32(vec![0; len]),
            SampleFormat::Float32 => SampleData::F32(vec![0.0; len]),
        };
        Self::new(channels, sample_rate, data)
    }

    /// Builds a buffer from per-channel float planes, converting to `format`.
    ///
    /// Out-of-range values are clipped; the clip count is returned alongside
    /// the buffer so callers can report the loss.
    ///
    /// # Errors
    /// Returns [`PitchError::InvalidParameter`] if there are no planes, the
    /// planes have different lengths, or any sample is NaN or infinite.
    pub fn from_planar_f32(
        planes: &[Vec<f32>],
        sample_rate: u32,
        format: SampleFormat,
    ) -> Result<(Self, usize), PitchError> {
        if planes.is_empty() || planes.len() > u16::MAX as usize {
            return Err(PitchError::InvalidParameter(format!(
                "unsupported channel count {}",
                planes.len()
            )));
        }
        let frames = planes[0].len();
        if planes.iter().any(|p| p.len() != frames) {
            return Err(PitchError::InvalidParameter(
                "all channels must have the same number of frames".to_string(),
            ));
        }
        if planes.iter().flatten().any(|s| !s.is_finite()) {
            return Err(PitchError::InvalidParameter(
                "processed audio contains non-finite samples".to_string(),
            ));
        }
        let interleaved: Vec<f32> = (0..frames)
            .flat_map(|i| planes.iter().map(move |p| p[i]))
            .collect();
        let (data, clipped) = SampleData::from_f32(&interleaved, format);
        let buffer = Self::new(planes.len() as u16, sample_rate, data)?;
        Ok((buffer, clipped))
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn sample_format(&self) -> SampleFormat {
        self.data.format()
    }

    #[inline]
    pub fn samples(&self) -> &SampleData {
        &self.data
    }

    /// Consumes the buffer, returning its sample storage.
    pub fn into_samples(self) -> SampleData {
        self.data
    }

    /// Number of frames (total samples / channels).
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.data.len() / self.channels as usize
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Returns true if the buffer contains no frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a new buffer with the same samples labelled with another rate.
    ///
    /// Playing the result changes pitch and speed together.
    pub fn with_sample_rate(&self, sample_rate: u32) -> Result<Self, PitchError> {
        Self::new(self.channels, sample_rate, self.data.clone())
    }

    /// Get a single channel's data as floats in `[-1.0, 1.0]`.
    pub fn channel_data(&self, channel: u16) -> Vec<f32> {
        if channel >= self.channels {
            return Vec::new();
        }
        let num_ch = self.channels as usize;
        (channel as usize..self.data.len())
            .step_by(num_ch)
            .map(|i| self.data.get_f32(i))
            .collect()
    }

    /// Deinterleaves into one float vector per channel.
    pub fn to_planar_f32(&self) -> Vec<Vec<f32>> {
        (0..self.channels).map(|ch| self.channel_data(ch)).collect()
    }

    /// All samples as interleaved floats.
    pub fn to_interleaved_f32(&self) -> Vec<f32> {
        (0..self.data.len()).map(|i| self.data.get_f32(i)).collect()
    }
}
