//! Core types, window functions, and resampling utilities.

pub mod buffer;
pub mod fft;
pub mod resample;
pub mod types;
pub mod window;

pub use buffer::{SampleBuffer, SampleData};
pub use resample::Interpolation;
pub use types::*;
