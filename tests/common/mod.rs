#![allow(dead_code)]

use std::f32::consts::PI;

use voxshift::SampleBuffer;

pub fn gen_sine(freq_hz: f32, sr: u32, n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f32 / sr as f32).sin())
        .collect()
}

pub fn gen_two_tone(
    freq_a: f32,
    amp_a: f32,
    freq_b: f32,
    amp_b: f32,
    sr: u32,
    n: usize,
) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = i as f32 / sr as f32;
            amp_a * (2.0 * PI * freq_a * t).sin() + amp_b * (2.0 * PI * freq_b * t).sin()
        })
        .collect()
}

/// Harmonic series on `f0`: `amps[k]` is the amplitude of harmonic `k + 1`.
pub fn gen_harmonics(f0: f32, amps: &[f32], sr: u32, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = i as f32 / sr as f32;
            amps.iter()
                .enumerate()
                .map(|(k, &a)| a * (2.0 * PI * f0 * (k + 1) as f32 * t).sin())
                .sum()
        })
        .collect()
}

/// One second-ish mono Float32 sine buffer.
pub fn sine_buffer(freq_hz: f32, sr: u32, n: usize) -> SampleBuffer {
    SampleBuffer::from_f32(1, sr, gen_sine(freq_hz, sr, n, 0.5)).unwrap()
}

/// Interleaved stereo buffer with a different tone per channel.
pub fn stereo_buffer(freq_l: f32, freq_r: f32, sr: u32, n: usize) -> SampleBuffer {
    let left = gen_sine(freq_l, sr, n, 0.5);
    let right = gen_sine(freq_r, sr, n, 0.5);
    let data = left.iter().zip(&right).flat_map(|(&l, &r)| [l, r]).collect();
    SampleBuffer::from_f32(2, sr, data).unwrap()
}

pub fn rms(signal: &[f32]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

pub fn energy_at_freq(signal: &[f32], sr: u32, freq_hz: f32) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mut re = 0.0f64;
    let mut im = 0.0f64;
    for (i, &s) in signal.iter().enumerate() {
        let angle = 2.0 * std::f64::consts::PI * freq_hz as f64 * i as f64 / sr as f64;
        let sv = s as f64;
        re += sv * angle.cos();
        im -= sv * angle.sin();
    }
    (re * re + im * im).sqrt() / signal.len() as f64
}

pub fn assert_no_nan_inf(samples: &[f32], label: &str) {
    for (i, &s) in samples.iter().enumerate() {
        assert!(s.is_finite(), "{}: sample {} is not finite ({})", label, i, s);
    }
}

/// `2^(semitones / 12)`.
pub fn ratio(semitones: f64) -> f64 {
    (semitones / 12.0).exp2()
}
