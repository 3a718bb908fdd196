//! Transform and application configuration.
//!
//! Nothing here is global: a [`TransformConfig`] is handed to the
//! orchestrator, and the encoder path in [`AppConfig`] is handed to the
//! transcoder that needs it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{Interpolation, SampleFormat, Strategy};
use crate::error::PitchError;
use crate::preset::{PresetEntry, PresetTable};
use crate::shift::phase_vocoder::{DEFAULT_HOP_SIZE, DEFAULT_WINDOW_SIZE};
use crate::shift::resampling::DEFAULT_TARGET_SAMPLE_RATE;

/// Parameters controlling how a preset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Strategy used when a preset does not name one.
    pub strategy: Strategy,
    /// Canonical output sample rate in Hz (default: 44100).
    pub target_sample_rate: u32,
    /// Interpolation used for every rate conversion.
    pub interpolation: Interpolation,
    /// Phase-vocoder analysis window in frames (default: 2048).
    pub window_size: usize,
    /// Phase-vocoder hop in frames (default: 512).
    pub hop_size: usize,
    /// Canonical output format; `None` keeps the input's format.
    pub output_format: Option<SampleFormat>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            target_sample_rate: DEFAULT_TARGET_SAMPLE_RATE,
            interpolation: Interpolation::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
            output_format: None,
        }
    }
}

impl TransformConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_target_sample_rate(mut self, sample_rate: u32) -> Self {
        self.target_sample_rate = sample_rate;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Sets the phase-vocoder window and hop sizes.
    pub fn with_window(mut self, window_size: usize, hop_size: usize) -> Self {
        self.window_size = window_size;
        self.hop_size = hop_size;
        self
    }

    pub fn with_output_format(mut self, format: Option<SampleFormat>) -> Self {
        self.output_format = format;
        self
    }

    /// Validate all parameters.
    pub fn validate(&self) -> Result<(), PitchError> {
        if self.target_sample_rate == 0 {
            return Err(PitchError::InvalidParameter(
                "target_sample_rate must be positive".to_string(),
            ));
        }
        if self.window_size < 4 || !self.window_size.is_power_of_two() {
            return Err(PitchError::InvalidParameter(format!(
                "window_size must be a power of two >= 4, got {}",
                self.window_size
            )));
        }
        if self.hop_size == 0 || self.hop_size > self.window_size / 2 {
            return Err(PitchError::InvalidParameter(format!(
                "hop_size must be in 1..={}, got {}",
                self.window_size / 2,
                self.hop_size
            )));
        }
        Ok(())
    }
}

impl fmt::Display for TransformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "strategy={}, target_rate={}Hz, interpolation={:?}, window={}, hop={}",
            self.strategy, self.target_sample_rate, self.interpolation, self.window_size, self.hop_size
        )?;
        if let Some(format) = self.output_format {
            write!(f, ", format={}", format)?;
        }
        Ok(())
    }
}

/// Settings file for the command-line front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub transform: TransformConfig,
    /// Added on top of the canonical presets.
    pub presets: Vec<PresetEntry>,
    /// Encoder binary used for MP3 output.
    pub ffmpeg_path: Option<PathBuf>,
}

impl AppConfig {
    /// Parses a configuration from JSON text and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, PitchError> {
        let config: AppConfig = serde_json::from_str(json)
            .map_err(|e| PitchError::InvalidParameter(format!("invalid configuration: {}", e)))?;
        config.transform.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, PitchError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data).map_err(|e| match e {
            PitchError::InvalidParameter(msg) => {
                PitchError::InvalidParameter(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Canonical presets plus the ones declared in this configuration.
    pub fn preset_table(&self) -> Result<PresetTable, PitchError> {
        let mut table = PresetTable::canonical();
        table.extend_entries(self.presets.iter().cloned())?;
        Ok(table)
    }
}
