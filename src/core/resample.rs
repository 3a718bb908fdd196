//! Sample-rate conversion via linear, cubic, and windowed-sinc interpolation.
//!
//! Every interpolator maps the first input sample onto the first output
//! sample and the last onto the last, so a signal converted to `output_len`
//! frames keeps its full extent.

use serde::{Deserialize, Serialize};

use crate::core::window::bessel_i0;

/// Interpolation kernel used for rate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Linear,
    /// 4-point Hermite.
    #[default]
    Cubic,
    /// Kaiser-windowed sinc with 8 lobes.
    Sinc,
}

impl Interpolation {
    /// Resamples a mono signal to exactly `output_len` samples.
    pub fn resample(self, input: &[f32], output_len: usize) -> Vec<f32> {
        match self {
            Interpolation::Linear => resample_linear(input, output_len),
            Interpolation::Cubic => resample_cubic(input, output_len),
            Interpolation::Sinc => resample_sinc(input, output_len, DEFAULT_SINC_LOBES),
        }
    }
}

impl std::str::FromStr for Interpolation {
    type Err = crate::error::PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Interpolation::Linear),
            "cubic" => Ok(Interpolation::Cubic),
            "sinc" => Ok(Interpolation::Sinc),
            other => Err(crate::error::PitchError::InvalidParameter(format!(
                "unknown interpolation '{}' (expected linear, cubic or sinc)",
                other
            ))),
        }
    }
}

/// Number of frames a signal of `frames` frames occupies after converting
/// from `from_rate` to `to_rate`.
#[inline]
pub fn converted_len(frames: usize, from_rate: u32, to_rate: u32) -> usize {
    if from_rate == 0 {
        return 0;
    }
    (frames as f64 * to_rate as f64 / from_rate as f64).round() as usize
}

/// Input position step per output sample.
#[inline]
fn position_step(input_len: usize, output_len: usize) -> f64 {
    (input_len - 1) as f64 / (output_len - 1).max(1) as f64
}

/// Linear interpolation resampling.
pub fn resample_linear(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() == 1 {
        return vec![input[0]; output_len];
    }

    let step = position_step(input.len(), output_len);
    let last = input.len() - 1;
    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            if idx < last {
                input[idx] + (input[idx + 1] - input[idx]) * frac
            } else {
                input[last]
            }
        })
        .collect()
}

/// Cubic interpolation resampling.
///
/// Uses 4-point Hermite interpolation; falls back to linear below 4 samples.
pub fn resample_cubic(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() < 4 {
        return resample_linear(input, output_len);
    }

    let step = position_step(input.len(), output_len);
    let last = input.len() - 1;
    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let t = (pos - idx as f64) as f32;

            let s0 = input[idx.saturating_sub(1)];
            let s1 = input[idx];
            let s2 = input[(idx + 1).min(last)];
            let s3 = input[(idx + 2).min(last)];

            let c1 = 0.5 * (s2 - s0);
            let c2 = s0 - 2.5 * s1 + 2.0 * s2 - 0.5 * s3;
            let c3 = 0.5 * (s3 - s0) + 1.5 * (s1 - s2);
            ((c3 * t + c2) * t + c1) * t + s1
        })
        .collect()
}

/// Default number of sinc lobes.
const DEFAULT_SINC_LOBES: usize = 8;

/// Kaiser beta for the sinc kernel (~60 dB stopband).
const SINC_KAISER_BETA: f64 = 6.0;

/// Windowed-sinc resampling.
///
/// When downsampling, the kernel is widened by the conversion ratio so it
/// also acts as the anti-aliasing low-pass. Falls back to cubic for inputs
/// shorter than `2 * lobes`.
pub fn resample_sinc(input: &[f32], output_len: usize, lobes: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    let lobes = lobes.max(1);
    if input.len() < 2 * lobes {
        return resample_cubic(input, output_len);
    }

    let step = position_step(input.len(), output_len);
    // Cutoff relative to the input Nyquist.
    let cutoff = if step > 1.0 { 1.0 / step } else { 1.0 };
    let half_width = (lobes as f64 / cutoff).ceil() as isize;
    let bessel_beta = bessel_i0(SINC_KAISER_BETA);

    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let center = pos.floor() as isize;

            let mut acc = 0.0f64;
            let mut weight_sum = 0.0f64;
            for j in (center - half_width + 1)..=(center + half_width) {
                if j < 0 || j >= input.len() as isize {
                    continue;
                }
                let x = (pos - j as f64) * cutoff;
                let t = x / lobes as f64;
                if t.abs() > 1.0 {
                    continue;
                }
                let sinc = if x.abs() < 1e-10 {
                    1.0
                } else {
                    let pi_x = std::f64::consts::PI * x;
                    pi_x.sin() / pi_x
                };
                let window = bessel_i0(SINC_KAISER_BETA * (1.0 - t * t).max(0.0).sqrt())
                    / bessel_beta;
                let w = sinc * window;
                acc += input[j as usize] as f64 * w;
                weight_sum += w;
            }

            // Unity DC gain.
            if weight_sum.abs() > 1e-10 {
                acc /= weight_sum;
            }
            acc as f32
        })
        .collect()
}
