//! Spectral analysis used for reporting and verification.

pub mod frequency;

pub use frequency::{dominant_frequency, spectral_centroid};
