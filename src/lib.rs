#![forbid(unsafe_code)]
//! Pure Rust voice pitch shifting with named presets.
//!
//! `voxshift` raises or lowers the pitch of recorded voices ("Man to Woman",
//! "Deep Voice", ...) using one of two strategies: cheap sample-rate
//! relabelling, which changes duration together with pitch, or a phase
//! vocoder, which keeps the duration intact. Every result is brought back to
//! a canonical sample rate so it can be handed straight to an encoder.
//!
//! # Quick Start
//!
//! ```
//! use voxshift::{PresetTable, SampleBuffer};
//!
//! // 1 second of 440 Hz sine at 44.1 kHz
//! let samples: Vec<f32> = (0..44100)
//!     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
//!     .collect();
//! let input = SampleBuffer::from_f32(1, 44100, samples).unwrap();
//!
//! let output = voxshift::shift_pitch(&input, "Man to Woman", &PresetTable::canonical()).unwrap();
//! assert_eq!(output.sample_rate(), 44100);
//! assert!(output.frame_count() < input.frame_count()); // resampling shortens
//! ```
//!
//! # Keeping the duration
//!
//! ```
//! use voxshift::{SampleBuffer, Strategy, TransformConfig, VoiceChanger};
//!
//! let config = TransformConfig::default().with_strategy(Strategy::PhaseVocoder);
//! let changer = VoiceChanger::canonical(config);
//!
//! let input = SampleBuffer::from_f32(1, 44100, vec![0.0; 8192]).unwrap();
//! let output = changer.shift_pitch(&input, "Deep Voice").unwrap();
//! assert_eq!(output.frame_count(), 8192);
//! ```

pub mod analysis;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod normalize;
pub mod orchestrator;
pub mod preset;
pub mod shift;

pub use config::{AppConfig, TransformConfig};
pub use crate::core::{
    Interpolation, PitchShiftRequest, SampleBuffer, SampleData, SampleFormat, Strategy,
};
pub use error::{PitchError, Result};
pub use io::{shift_audio_file, Transcoder};
pub use normalize::FormatNormalizer;
pub use orchestrator::VoiceChanger;
pub use preset::{Preset, PresetEntry, PresetTable};
pub use shift::{PhaseVocoderShifter, PitchShifter, ResamplingShifter};

/// Applies a preset from `presets` to `buffer` with the default
/// [`TransformConfig`].
///
/// # Errors
/// [`PitchError::UnknownPreset`] if `preset_name` is not registered, and
/// [`PitchError::InvalidParameter`] if the shift cannot be represented.
pub fn shift_pitch(
    buffer: &SampleBuffer,
    preset_name: &str,
    presets: &PresetTable,
) -> Result<SampleBuffer> {
    orchestrator::apply(buffer, preset_name, presets, &TransformConfig::default())
}
