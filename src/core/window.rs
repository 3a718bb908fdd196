//! Window functions for spectral analysis.

use std::f64::consts::PI;

/// Maximum number of series terms for Bessel I0 convergence.
const BESSEL_MAX_TERMS: usize = 30;
/// Relative convergence threshold for Bessel I0 series.
const BESSEL_CONVERGENCE: f64 = 1e-15;

/// Generates a periodic Hann window.
///
/// The periodic form (denominator `size` rather than `size - 1`) sums to a
/// constant under overlap-add at hops of `size / 2` and `size / 4`.
pub fn hann_window(size: usize) -> Vec<f32> {
    match size {
        0 => return vec![],
        1 => return vec![1.0],
        _ => {}
    }
    let n = size as f64;
    (0..size)
        .map(|i| (0.5 * (1.0 - (2.0 * PI * i as f64 / n).cos())) as f32)
        .collect()
}

/// Zeroth-order modified Bessel function of the first kind.
/// Computed via series expansion.
#[inline]
pub(crate) fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    let x_half = x / 2.0;
    for k in 1..BESSEL_MAX_TERMS {
        term *= (x_half / k as f64) * (x_half / k as f64);
        sum += term;
        if term < BESSEL_CONVERGENCE * sum {
            break;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_degenerate_sizes() {
        assert!(hann_window(0).is_empty());
        assert_eq!(hann_window(1), vec![1.0]);
    }

    #[test]
    fn test_hann_shape() {
        let w = hann_window(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
        // Periodic: symmetric around the centre sample.
        assert!((w[1] - w[7]).abs() < 1e-6);
        assert!((w[3] - w[5]).abs() < 1e-6);
    }

    #[test]
    fn test_hann_squared_overlap_is_constant() {
        let size = 64;
        let hop = size / 4;
        let w = hann_window(size);
        let mut sum = vec![0.0f32; size * 4];
        for start in (0..sum.len() - size + 1).step_by(hop) {
            for (i, &v) in w.iter().enumerate() {
                sum[start + i] += v * v;
            }
        }
        // Fully overlapped region.
        let steady = &sum[size..sum.len() - size];
        let first = steady[0];
        assert!(steady.iter().all(|&s| (s - first).abs() < 1e-4));
        assert!((first - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_bessel_i0_known_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-10);
        assert!((bessel_i0(1.0) - 1.266_065_877_7).abs() < 1e-6);
        assert!((bessel_i0(3.0) - 4.880_792_585).abs() < 1e-4);
    }
}
