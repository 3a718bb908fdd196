use rustfft::{num_complex::Complex, FftPlanner};

use crate::core::window::hann_window;

/// Largest analysis size used by [`dominant_frequency`].
pub const MAX_ANALYSIS_SIZE: usize = 65_536;

/// Magnitudes below this are treated as silence.
const SILENCE_FLOOR: f32 = 1e-6;

/// Hann-windowed magnitude spectrum of the largest power-of-two prefix of
/// `samples`, capped at [`MAX_ANALYSIS_SIZE`]. Returns the spectrum up to
/// Nyquist and the FFT size used.
fn magnitude_spectrum(samples: &[f32]) -> Option<(Vec<f32>, usize)> {
    if samples.len() < 4 {
        return None;
    }
    let fft_size = prev_power_of_two(samples.len()).min(MAX_ANALYSIS_SIZE);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);

    let window = hann_window(fft_size);
    let mut buffer: Vec<Complex<f32>> = samples[..fft_size]
        .iter()
        .zip(window.iter())
        .map(|(&s, &w)| Complex::new(s * w, 0.0))
        .collect();
    fft.process(&mut buffer);

    let half = fft_size / 2 + 1;
    Some((buffer[..half].iter().map(|c| c.norm()).collect(), fft_size))
}

#[inline]
fn prev_power_of_two(n: usize) -> usize {
    if n.is_power_of_two() {
        n
    } else {
        n.next_power_of_two() >> 1
    }
}

/// Estimates the strongest frequency component of a mono signal in Hz.
///
/// The peak bin is refined by fitting a parabola through the log
/// magnitudes of the peak and its neighbours. Returns 0.0 for empty or
/// silent input.
pub fn dominant_frequency(samples: &[f32], sample_rate: u32) -> f32 {
    let Some((magnitudes, fft_size)) = magnitude_spectrum(samples) else {
        return 0.0;
    };

    // Skip DC.
    let (peak, peak_mag) = magnitudes
        .iter()
        .enumerate()
        .skip(1)
        .fold((0usize, 0.0f32), |best, (bin, &mag)| {
            if mag > best.1 {
                (bin, mag)
            } else {
                best
            }
        });
    if peak == 0 || peak_mag < SILENCE_FLOOR {
        return 0.0;
    }

    let mut position = peak as f32;
    if peak + 1 < magnitudes.len() {
        let a = magnitudes[peak - 1].max(SILENCE_FLOOR).ln();
        let b = peak_mag.ln();
        let c = magnitudes[peak + 1].max(SILENCE_FLOOR).ln();
        let denom = a - 2.0 * b + c;
        if denom.abs() > f32::EPSILON {
            position += (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
        }
    }

    position * sample_rate as f32 / fft_size as f32
}

/// Computes the spectral centroid of a signal in Hz.
///
/// The spectral centroid is the "center of mass" of the spectrum, used to
/// report how bright a voice sounds before and after a shift.
pub fn spectral_centroid(samples: &[f32], sample_rate: u32) -> f32 {
    let Some((magnitudes, fft_size)) = magnitude_spectrum(samples) else {
        return 0.0;
    };

    let freq_resolution = sample_rate as f64 / fft_size as f64;
    let mut weighted_sum = 0.0f64;
    let mut magnitude_sum = 0.0f64;
    for (bin, &mag) in magnitudes.iter().enumerate() {
        weighted_sum += bin as f64 * freq_resolution * mag as f64;
        magnitude_sum += mag as f64;
    }

    if magnitude_sum > SILENCE_FLOOR as f64 {
        (weighted_sum / magnitude_sum) as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_dominant_frequency_a4() {
        let samples = sine(440.0, 44100, 44100);
        let freq = dominant_frequency(&samples, 44100);
        assert!((freq - 440.0).abs() < 1.0, "expected ~440 Hz, got {freq}");
    }

    #[test]
    fn test_dominant_frequency_between_bins() {
        let samples = sine(554.37, 44100, 44100);
        let freq = dominant_frequency(&samples, 44100);
        assert!((freq - 554.37).abs() < 1.0, "expected ~554.37 Hz, got {freq}");
    }

    #[test]
    fn test_dominant_frequency_picks_louder_partial() {
        let low = sine(200.0, 48000, 16384);
        let high = sine(1200.0, 48000, 16384);
        let mixed: Vec<f32> = low.iter().zip(&high).map(|(l, h)| 0.3 * l + 0.7 * h).collect();
        let freq = dominant_frequency(&mixed, 48000);
        assert!((freq - 1200.0).abs() < 5.0, "expected ~1200 Hz, got {freq}");
    }

    #[test]
    fn test_dominant_frequency_silence_and_empty() {
        assert_eq!(dominant_frequency(&[0.0; 4096], 44100), 0.0);
        assert_eq!(dominant_frequency(&[], 44100), 0.0);
        assert_eq!(dominant_frequency(&[0.5, -0.5], 44100), 0.0);
    }

    #[test]
    fn test_prev_power_of_two() {
        assert_eq!(prev_power_of_two(44100), 32768);
        assert_eq!(prev_power_of_two(4096), 4096);
        assert_eq!(prev_power_of_two(5), 4);
    }

    #[test]
    fn test_spectral_centroid_low_freq() {
        let samples = sine(100.0, 44100, 4096);
        let centroid = spectral_centroid(&samples, 44100);
        assert!(
            centroid > 50.0 && centroid < 200.0,
            "Centroid for 100 Hz sine should be near 100 Hz, got {centroid}"
        );
    }

    #[test]
    fn test_spectral_centroid_high_freq() {
        let samples = sine(5000.0, 44100, 4096);
        let centroid = spectral_centroid(&samples, 44100);
        assert!(
            centroid > 4000.0 && centroid < 6000.0,
            "Centroid for 5 kHz sine should be near 5000 Hz, got {centroid}"
        );
    }

    #[test]
    fn test_spectral_centroid_silence() {
        assert_eq!(spectral_centroid(&[0.0f32; 4096], 44100), 0.0);
    }
}
