//! Duration-preserving pitch shifting with a phase vocoder.
//!
//! Each channel is cut into Hann-windowed frames, analysed with an FFT,
//! and its magnitude/instantaneous-frequency spectrum is stretched along
//! the frequency axis by the pitch ratio. Phases of spectral peaks are
//! accumulated from the shifted frequencies; the remaining bins are locked
//! to their nearest peak. Frames are overlap-added with the analysis hop,
//! so the frame count of the output equals the input's.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use tracing::debug;

use crate::core::fft::{COMPLEX_ZERO, MAGNITUDE_FLOOR, WINDOW_SUM_EPSILON, WINDOW_SUM_FLOOR_RATIO};
use crate::core::window::hann_window;
use crate::core::{semitone_ratio, SampleBuffer, Strategy};
use crate::error::PitchError;
use crate::shift::{build_output, compute_rms, normalize_rms, validate_semitones, PitchShifter};

const TWO_PI: f32 = 2.0 * PI;

/// Default analysis window, in frames.
pub const DEFAULT_WINDOW_SIZE: usize = 2048;
/// Default hop between analysis windows, in frames.
pub const DEFAULT_HOP_SIZE: usize = 512;

/// Magnitude and phase of one analysis window.
#[derive(Debug, Clone)]
struct StftFrame {
    magnitude: Vec<f32>,
    phase: Vec<f32>,
    /// Instantaneous frequency per bin, in bins.
    frequency: Vec<f32>,
}

impl StftFrame {
    fn new(num_bins: usize) -> Self {
        Self {
            magnitude: vec![0.0; num_bins],
            phase: vec![0.0; num_bins],
            frequency: vec![0.0; num_bins],
        }
    }
}

/// Phase-vocoder pitch shifter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseVocoderShifter {
    window_size: usize,
    hop_size: usize,
}

impl Default for PhaseVocoderShifter {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
        }
    }
}

impl PhaseVocoderShifter {
    /// Creates a shifter with the given window and hop sizes.
    ///
    /// # Errors
    /// Returns [`PitchError::InvalidParameter`] unless `window_size` is a power
    /// of two of at least 4 and `0 < hop_size <= window_size / 2`.
    pub fn new(window_size: usize, hop_size: usize) -> Result<Self, PitchError> {
        if window_size < 4 || !window_size.is_power_of_two() {
            return Err(PitchError::InvalidParameter(format!(
                "window size must be a power of two >= 4, got {}",
                window_size
            )));
        }
        if hop_size == 0 || hop_size > window_size / 2 {
            return Err(PitchError::InvalidParameter(format!(
                "hop size must be in 1..={}, got {}",
                window_size / 2,
                hop_size
            )));
        }
        Ok(Self {
            window_size,
            hop_size,
        })
    }

    #[inline]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }
}

impl PitchShifter for PhaseVocoderShifter {
    fn strategy(&self) -> Strategy {
        Strategy::PhaseVocoder
    }

    fn shift(&self, buffer: &SampleBuffer, semitones: f64) -> Result<SampleBuffer, PitchError> {
        validate_semitones(semitones)?;
        if semitones == 0.0 || buffer.is_empty() {
            return Ok(buffer.clone());
        }

        let ratio = semitone_ratio(semitones) as f32;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(PitchError::InvalidParameter(format!(
                "pitch ratio for {} semitones is not representable",
                semitones
            )));
        }
        debug!(
            semitones,
            ratio,
            window = self.window_size,
            hop = self.hop_size,
            frames = buffer.frame_count(),
            channels = buffer.channels(),
            "phase vocoder shift"
        );

        let mut vocoder = ChannelVocoder::new(self.window_size, self.hop_size);
        let planes: Vec<Vec<f32>> = buffer
            .to_planar_f32()
            .iter()
            .map(|channel| {
                let mut shifted = vocoder.process(channel, ratio);
                normalize_rms(&mut shifted, compute_rms(channel));
                shifted
            })
            .collect();

        build_output(
            &planes,
            buffer.sample_rate(),
            buffer.sample_format(),
            "phase-vocoder",
        )
    }
}

/// Per-call analysis/synthesis state. Phase tracking is reset per channel.
struct ChannelVocoder {
    window_size: usize,
    hop: usize,
    window: Vec<f32>,
    fft_forward: Arc<dyn Fft<f32>>,
    fft_inverse: Arc<dyn Fft<f32>>,
    /// Pre-computed expected phase advance per bin over one hop.
    expected_phase_advance: Vec<f32>,
    prev_phase: Vec<f32>,
    synth_phase: Vec<f32>,
    /// Whether a synthesis bin carried energy in the previous frame.
    active: Vec<bool>,
    /// Peak bins of the current shifted frame (reused across frames).
    peaks: Vec<usize>,
    fft_buffer: Vec<Complex<f32>>,
    analysis: StftFrame,
    shifted: StftFrame,
}

impl ChannelVocoder {
    fn new(window_size: usize, hop: usize) -> Self {
        let num_bins = window_size / 2 + 1;
        let mut planner = FftPlanner::new();
        let expected_phase_advance = (0..num_bins)
            .map(|bin| TWO_PI * bin as f32 * hop as f32 / window_size as f32)
            .collect();

        Self {
            window_size,
            hop,
            window: hann_window(window_size),
            fft_forward: planner.plan_fft_forward(window_size),
            fft_inverse: planner.plan_fft_inverse(window_size),
            expected_phase_advance,
            prev_phase: vec![0.0; num_bins],
            synth_phase: vec![0.0; num_bins],
            active: vec![false; num_bins],
            peaks: Vec::with_capacity(num_bins / 2),
            fft_buffer: vec![COMPLEX_ZERO; window_size],
            analysis: StftFrame::new(num_bins),
            shifted: StftFrame::new(num_bins),
        }
    }

    #[inline]
    fn num_bins(&self) -> usize {
        self.window_size / 2 + 1
    }

    /// Shifts one channel by `ratio`, returning exactly `input.len()` samples.
    fn process(&mut self, input: &[f32], ratio: f32) -> Vec<f32> {
        if input.is_empty() {
            return Vec::new();
        }
        let n = self.window_size;
        let half = n / 2;

        // Leading pad of a full window gives every input sample full overlap;
        // the trailing pad lets the last frame cover the tail.
        let mut padded = vec![0.0f32; n + input.len() + n + self.hop];
        padded[n..n + input.len()].copy_from_slice(input);

        let num_frames = (padded.len() - n) / self.hop + 1;
        let mut output = vec![0.0f32; padded.len()];
        let mut window_sum = vec![0.0f32; padded.len()];

        self.prev_phase.iter_mut().for_each(|p| *p = 0.0);
        self.synth_phase.iter_mut().for_each(|p| *p = 0.0);
        self.active.iter_mut().for_each(|a| *a = false);
        let norm = 1.0 / n as f32;

        for frame_idx in 0..num_frames {
            let pos = frame_idx * self.hop;

            // Zero-phase windowing: rotate the frame so the window centre sits
            // at index 0 and all bins of a partial share one phase.
            for i in 0..n {
                let j = (i + half) % n;
                self.fft_buffer[i] = Complex::new(padded[pos + j] * self.window[j], 0.0);
            }
            self.fft_forward.process(&mut self.fft_buffer);

            self.analyze();
            self.shift_spectrum(ratio);
            self.synthesize();

            self.fft_inverse.process(&mut self.fft_buffer);

            for j in 0..n {
                let i = (j + half) % n;
                let w = self.window[j];
                output[pos + j] += self.fft_buffer[i].re * norm * w;
                window_sum[pos + j] += w * w;
            }
        }

        normalize_output(&mut output, &window_sum);
        output[n..n + input.len()].to_vec()
    }

    /// Extracts magnitudes and instantaneous frequencies (in bins) from the
    /// forward FFT in `fft_buffer`.
    fn analyze(&mut self) {
        let bin_per_radian = self.window_size as f32 / (TWO_PI * self.hop as f32);
        for bin in 0..self.num_bins() {
            let c = self.fft_buffer[bin];
            let magnitude = c.norm();
            let phase = c.arg();
            self.analysis.magnitude[bin] = magnitude;
            self.analysis.phase[bin] = phase;

            self.analysis.frequency[bin] = if magnitude < MAGNITUDE_FLOOR {
                bin as f32
            } else {
                let deviation =
                    wrap_phase(phase - self.prev_phase[bin] - self.expected_phase_advance[bin]);
                bin as f32 + deviation * bin_per_radian
            };
            self.prev_phase[bin] = phase;
        }
    }

    /// Stretches the analysed spectrum along the frequency axis by `ratio`.
    fn shift_spectrum(&mut self, ratio: f32) {
        let num_bins = self.num_bins();
        let last = num_bins - 1;
        for bin in 0..num_bins {
            let source = bin as f32 / ratio;
            let lo = source.floor() as usize;
            if lo > last {
                // Above Nyquist in the source.
                self.shifted.magnitude[bin] = 0.0;
                self.shifted.phase[bin] = 0.0;
                self.shifted.frequency[bin] = bin as f32;
                continue;
            }
            let hi = (lo + 1).min(last);
            let frac = source - lo as f32;

            let mag_lo = self.analysis.magnitude[lo];
            let mag_hi = self.analysis.magnitude[hi];
            self.shifted.magnitude[bin] = mag_lo + (mag_hi - mag_lo) * frac;

            // Phase and frequency come from the nearest source bin so that
            // side-lobe sign changes survive the shift.
            let nearest = if frac < 0.5 { lo } else { hi };
            self.shifted.phase[bin] = self.analysis.phase[nearest];
            self.shifted.frequency[bin] = self.analysis.frequency[nearest] * ratio;
        }
    }

    /// Accumulates synthesis phases from the shifted frequencies, locks
    /// non-peak bins to their nearest peak and writes the Hermitian spectrum
    /// into `fft_buffer`.
    ///
    /// A bin that was silent in the previous frame restarts from the analysis
    /// phase of its source bin; at a ratio of 1 this reproduces the input.
    fn synthesize(&mut self) {
        let n = self.window_size;
        let num_bins = self.num_bins();
        let radians_per_bin = TWO_PI * self.hop as f32 / n as f32;

        for bin in 0..num_bins {
            if self.shifted.magnitude[bin] < MAGNITUDE_FLOOR {
                self.active[bin] = false;
                continue;
            }
            self.synth_phase[bin] = if self.active[bin] {
                wrap_phase(self.synth_phase[bin] + self.shifted.frequency[bin] * radians_per_bin)
            } else {
                self.shifted.phase[bin]
            };
            self.active[bin] = true;
        }

        identity_phase_lock(
            &self.shifted.magnitude,
            &self.shifted.phase,
            &mut self.synth_phase,
            &mut self.peaks,
        );

        for bin in 0..num_bins {
            self.fft_buffer[bin] = if self.active[bin] {
                Complex::from_polar(self.shifted.magnitude[bin], self.synth_phase[bin])
            } else {
                COMPLEX_ZERO
            };
        }
        // DC and Nyquist must be real for a real-valued inverse.
        self.fft_buffer[0].im = 0.0;
        self.fft_buffer[num_bins - 1].im = 0.0;
        for bin in 1..num_bins - 1 {
            self.fft_buffer[n - bin] = self.fft_buffer[bin].conj();
        }
    }
}

/// Identity phase locking: every audible non-peak bin keeps the phase offset
/// it had from its nearest spectral peak in the analysis frame.
fn identity_phase_lock(
    magnitudes: &[f32],
    analysis_phases: &[f32],
    synthesis_phases: &mut [f32],
    peaks: &mut Vec<usize>,
) {
    let num_bins = magnitudes.len();
    if num_bins < 3 {
        return;
    }

    peaks.clear();
    for bin in 1..num_bins - 1 {
        let m = magnitudes[bin];
        if m >= MAGNITUDE_FLOOR && m > magnitudes[bin - 1] && m > magnitudes[bin + 1] {
            peaks.push(bin);
        }
    }
    if peaks.is_empty() {
        return;
    }

    let mut peak_idx = 0;
    for bin in 0..num_bins {
        while peak_idx + 1 < peaks.len()
            && peaks[peak_idx + 1].abs_diff(bin) < peaks[peak_idx].abs_diff(bin)
        {
            peak_idx += 1;
        }
        let nearest_peak = peaks[peak_idx];
        if bin != nearest_peak && magnitudes[bin] >= MAGNITUDE_FLOOR {
            let offset = analysis_phases[bin] - analysis_phases[nearest_peak];
            synthesis_phases[bin] = wrap_phase(synthesis_phases[nearest_peak] + offset);
        }
    }
}

/// Normalizes output by window sum, clamping to prevent amplification in
/// low-overlap regions.
fn normalize_output(output: &mut [f32], window_sum: &[f32]) {
    let max_window_sum = window_sum.iter().cloned().fold(0.0f32, f32::max);
    let min_window_sum = (max_window_sum * WINDOW_SUM_FLOOR_RATIO).max(WINDOW_SUM_EPSILON);
    for (sample, &ws) in output.iter_mut().zip(window_sum.iter()) {
        *sample /= ws.max(min_window_sum);
    }
}

/// Wraps a phase value to [-PI, PI).
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let p = phase + PI;
    p - (p / TWO_PI).floor() * TWO_PI - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleFormat;

    fn sine(freq: f32, rate: u32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| 0.5 * (TWO_PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    fn zero_crossing_freq(signal: &[f32], rate: u32) -> f32 {
        let crossings = signal
            .windows(2)
            .filter(|w| w[0] <= 0.0 && w[1] > 0.0)
            .count();
        crossings as f32 * rate as f32 / signal.len() as f32
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(0.0) - 0.0).abs() < 1e-5);
        assert!((wrap_phase(PI + 0.1) - (-PI + 0.1)).abs() < 1e-5);
        assert!((wrap_phase(-PI - 0.1) - (PI - 0.1)).abs() < 1e-5);
        assert!((wrap_phase(10.0 * PI + 0.5) - wrap_phase(0.5)).abs() < 1e-4);
    }

    #[test]
    fn test_new_validates_sizes() {
        assert!(PhaseVocoderShifter::new(2048, 512).is_ok());
        assert!(PhaseVocoderShifter::new(2000, 500).is_err());
        assert!(PhaseVocoderShifter::new(2048, 0).is_err());
        assert!(PhaseVocoderShifter::new(2048, 2048).is_err());
        assert!(PhaseVocoderShifter::new(2, 1).is_err());
    }

    #[test]
    fn test_unity_ratio_reconstructs_signal() {
        let input = sine(440.0, 44100, 8192);
        let mut vocoder = ChannelVocoder::new(2048, 512);
        let output = vocoder.process(&input, 1.0);
        assert_eq!(output.len(), input.len());
        let max_err = input
            .iter()
            .zip(&output)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 1e-2, "max reconstruction error {}", max_err);
    }

    #[test]
    fn test_octave_up_doubles_frequency() {
        let rate = 44100;
        let input = sine(300.0, rate, rate as usize);
        let mut vocoder = ChannelVocoder::new(2048, 512);
        let output = vocoder.process(&input, 2.0);
        assert_eq!(output.len(), input.len());

        let freq = zero_crossing_freq(&output[4096..40000], rate);
        assert!((freq - 600.0).abs() < 15.0, "estimated {} Hz", freq);
    }

    #[test]
    fn test_phase_lock_keeps_offsets_from_nearest_peak() {
        let magnitudes = [0.0, 0.5, 1.0, 0.5, 0.1, 0.6, 0.2];
        let analysis = [0.0, 0.3, 0.1, -0.2, 1.0, 0.4, 0.9];
        let mut synthesis = [0.0, 0.0, 2.0, 0.0, 0.0, -1.0, 0.0];
        let mut peaks = Vec::new();
        identity_phase_lock(&magnitudes, &analysis, &mut synthesis, &mut peaks);

        assert_eq!(peaks, vec![2, 5]);
        assert_eq!(synthesis[2], 2.0);
        assert_eq!(synthesis[5], -1.0);
        assert!((synthesis[1] - 2.2).abs() < 1e-5);
        assert!((synthesis[3] - 1.7).abs() < 1e-5);
        assert!((synthesis[4] - (-0.4)).abs() < 1e-5);
        assert!((synthesis[6] - (-0.5)).abs() < 1e-5);
        // Silent bins are left alone.
        assert_eq!(synthesis[0], 0.0);
    }

    #[test]
    fn test_near_unity_ratio_keeps_two_partials() {
        let rate = 44100;
        let input: Vec<f32> = (0..16384)
            .map(|i| {
                let t = i as f32 / rate as f32;
                0.3 * (TWO_PI * 150.0 * t).sin() + 0.15 * (TWO_PI * 300.0 * t).sin()
            })
            .collect();
        let mut vocoder = ChannelVocoder::new(2048, 512);
        let output = vocoder.process(&input, 1.0001);
        let max_err = input
            .iter()
            .zip(&output)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 0.05, "max error {}", max_err);
    }

    #[test]
    fn test_short_input_is_padded() {
        let input = sine(440.0, 44100, 100);
        let buffer = SampleBuffer::from_f32(1, 44100, input).unwrap();
        let output = PhaseVocoderShifter::default().shift(&buffer, 3.0).unwrap();
        assert_eq!(output.frame_count(), 100);
        assert!(output.to_interleaved_f32().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_silence_stays_silent() {
        let buffer = SampleBuffer::silence(2, 44100, 5000, SampleFormat::Int16).unwrap();
        let output = PhaseVocoderShifter::default().shift(&buffer, -6.0).unwrap();
        assert_eq!(output, buffer);
    }

    #[test]
    fn test_preserves_frame_count_and_format() {
        let data: Vec<i32> = sine(220.0, 22050, 3000)
            .iter()
            .map(|&s| (s * 1_000_000_000.0) as i32)
            .collect();
        let buffer = SampleBuffer::from_i32(1, 22050, data).unwrap();
        let output = PhaseVocoderShifter::new(1024, 256)
            .unwrap()
            .shift(&buffer, -4.0)
            .unwrap();
        assert_eq!(output.frame_count(), 3000);
        assert_eq!(output.sample_rate(), 22050);
        assert_eq!(output.sample_format(), SampleFormat::Int32);
    }
}
