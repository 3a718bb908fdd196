//! Transform orchestration: preset lookup, strategy dispatch and output
//! normalization.

use tracing::debug;

use crate::config::{AppConfig, TransformConfig};
use crate::core::{PitchShiftRequest, SampleBuffer, Strategy};
use crate::error::PitchError;
use crate::normalize::FormatNormalizer;
use crate::preset::{Preset, PresetTable};
use crate::shift::{PhaseVocoderShifter, PitchShifter, ResamplingShifter};

/// Builds the shifter implementing `strategy` under `config`.
pub fn shifter_for(
    strategy: Strategy,
    config: &TransformConfig,
) -> Result<Box<dyn PitchShifter + Send + Sync>, PitchError> {
    Ok(match strategy {
        Strategy::Resample => Box::new(ResamplingShifter::new(
            config.target_sample_rate,
            config.interpolation,
        )?),
        Strategy::PhaseVocoder => Box::new(PhaseVocoderShifter::new(
            config.window_size,
            config.hop_size,
        )?),
    })
}

/// Resolves a preset into a request under `config`.
pub fn resolve_request(
    preset: &Preset,
    config: &TransformConfig,
) -> Result<PitchShiftRequest, PitchError> {
    PitchShiftRequest::new(
        preset.semitones,
        preset.strategy.unwrap_or(config.strategy),
        config.target_sample_rate,
    )
}

/// Executes a resolved request: shift, then normalize to the target rate.
pub fn execute(
    buffer: &SampleBuffer,
    request: &PitchShiftRequest,
    config: &TransformConfig,
) -> Result<SampleBuffer, PitchError> {
    let shifter = shifter_for(request.strategy(), config)?;
    let shifted = shifter.shift(buffer, request.semitones())?;
    FormatNormalizer::new(config.interpolation)
        .with_output_format(config.output_format)
        .normalize(shifted, request.target_sample_rate())
}

/// Applies the preset `preset_name` from `presets` to `buffer`.
///
/// The input buffer is only borrowed; on failure it is left exactly as it
/// was and no partial output is returned.
///
/// # Errors
/// [`PitchError::UnknownPreset`] if the name is not in the table,
/// [`PitchError::InvalidParameter`] for an invalid configuration or a
/// derived sample rate that cannot be represented.
pub fn apply(
    buffer: &SampleBuffer,
    preset_name: &str,
    presets: &PresetTable,
    config: &TransformConfig,
) -> Result<SampleBuffer, PitchError> {
    config.validate()?;
    let preset = presets.lookup(preset_name)?;
    let request = resolve_request(preset, config)?;
    debug!(
        preset = preset_name,
        semitones = request.semitones(),
        strategy = %request.strategy(),
        target_rate = request.target_sample_rate(),
        frames = buffer.frame_count(),
        "dispatching pitch shift"
    );
    execute(buffer, &request, config)
}

/// Preset table plus transform configuration: the entry point used by the
/// surrounding application.
///
/// # Example
///
/// ```
/// use voxshift::{SampleBuffer, VoiceChanger};
///
/// let mut changer = VoiceChanger::default();
/// changer.register_preset("Chipmunk", 7.0).unwrap();
///
/// let input = SampleBuffer::from_f32(1, 44100, vec![0.0; 4410]).unwrap();
/// let output = changer.shift_pitch(&input, "Chipmunk").unwrap();
/// assert_eq!(output.sample_rate(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceChanger {
    presets: PresetTable,
    config: TransformConfig,
}

impl Default for VoiceChanger {
    fn default() -> Self {
        Self::canonical(TransformConfig::default())
    }
}

impl VoiceChanger {
    /// Creates a changer over an explicit preset table.
    pub fn new(presets: PresetTable, config: TransformConfig) -> Result<Self, PitchError> {
        config.validate()?;
        Ok(Self { presets, config })
    }

    /// Creates a changer with the canonical presets.
    ///
    /// An invalid `config` is not rejected here; it surfaces from the first
    /// [`shift_pitch`](Self::shift_pitch) call instead.
    pub fn canonical(config: TransformConfig) -> Self {
        Self {
            presets: PresetTable::canonical(),
            config,
        }
    }

    /// Creates a changer from a loaded application configuration.
    pub fn from_app_config(app: &AppConfig) -> Result<Self, PitchError> {
        Self::new(app.preset_table()?, app.transform)
    }

    /// Adds or replaces a preset.
    pub fn register_preset(
        &mut self,
        name: impl Into<String>,
        semitones: f64,
    ) -> Result<(), PitchError> {
        self.presets.register(name, semitones)
    }

    /// Shifts `buffer` using the named preset.
    pub fn shift_pitch(
        &self,
        buffer: &SampleBuffer,
        preset_name: &str,
    ) -> Result<SampleBuffer, PitchError> {
        apply(buffer, preset_name, &self.presets, &self.config)
    }

    pub fn presets(&self) -> &PresetTable {
        &self.presets
    }

    pub fn presets_mut(&mut self) -> &mut PresetTable {
        &mut self.presets
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleFormat;

    fn sine(freq: f32, rate: u32, frames: usize) -> SampleBuffer {
        let data = (0..frames)
            .map(|i| 0.5 * (std::f32::consts::TAU * freq * i as f32 / rate as f32).sin())
            .collect();
        SampleBuffer::from_f32(1, rate, data).unwrap()
    }

    #[test]
    fn test_unknown_preset() {
        let input = sine(440.0, 44100, 1000);
        let before = input.clone();
        let result = apply(
            &input,
            "Robot",
            &PresetTable::canonical(),
            &TransformConfig::default(),
        );
        assert_eq!(result, Err(PitchError::UnknownPreset("Robot".to_string())));
        assert_eq!(input, before);
    }

    #[test]
    fn test_resample_strategy_changes_length() {
        let input = sine(440.0, 44100, 44100);
        let output = apply(
            &input,
            "Man to Woman",
            &PresetTable::canonical(),
            &TransformConfig::default(),
        )
        .unwrap();
        // 44100 * 44100 / 55563
        assert_eq!(output.frame_count(), 35002);
        assert_eq!(output.sample_rate(), 44100);
    }

    #[test]
    fn test_phase_vocoder_preserves_length() {
        let input = sine(440.0, 44100, 8192);
        let config = TransformConfig::default().with_strategy(Strategy::PhaseVocoder);
        let output = apply(&input, "Deep Voice", &PresetTable::canonical(), &config).unwrap();
        assert_eq!(output.frame_count(), 8192);
    }

    #[test]
    fn test_preset_strategy_overrides_default() {
        let mut presets = PresetTable::new();
        presets
            .register_preset(Preset::new("Steady", 3.0).with_strategy(Strategy::PhaseVocoder))
            .unwrap();
        let input = sine(440.0, 44100, 4096);
        let output = apply(&input, "Steady", &presets, &TransformConfig::default()).unwrap();
        assert_eq!(output.frame_count(), 4096);
    }

    #[test]
    fn test_output_normalized_to_target_rate() {
        let input = sine(440.0, 48000, 4800);
        let config = TransformConfig::default()
            .with_strategy(Strategy::PhaseVocoder)
            .with_target_sample_rate(22050);
        let output = apply(&input, "Baby Voice", &PresetTable::canonical(), &config).unwrap();
        assert_eq!(output.sample_rate(), 22050);
        assert_eq!(output.frame_count(), 2205);
    }

    #[test]
    fn test_output_format_applied() {
        let input = sine(440.0, 44100, 1000);
        let config = TransformConfig::default().with_output_format(Some(SampleFormat::Int16));
        let output = apply(&input, "Woman to Man", &PresetTable::canonical(), &config).unwrap();
        assert_eq!(output.sample_format(), SampleFormat::Int16);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let input = sine(440.0, 44100, 100);
        let config = TransformConfig::default().with_window(1000, 100);
        assert!(matches!(
            apply(&input, "Baby Voice", &PresetTable::canonical(), &config),
            Err(PitchError::InvalidParameter(_))
        ));
        assert!(VoiceChanger::new(PresetTable::new(), config).is_err());
    }

    #[test]
    fn test_voice_changer_register_and_shift() {
        let mut changer = VoiceChanger::default();
        changer.register_preset("Octave Up", 12.0).unwrap();
        let input = sine(220.0, 44100, 44100);
        let output = changer.shift_pitch(&input, "Octave Up").unwrap();
        assert_eq!(output.frame_count(), 22050);
        assert_eq!(changer.presets().len(), 8);
    }

    #[test]
    fn test_voice_changer_from_app_config() {
        let app = AppConfig::from_json_str(
            r#"{ "presets": [ { "name": "Whisper Lift", "cents": 250 } ] }"#,
        )
        .unwrap();
        let changer = VoiceChanger::from_app_config(&app).unwrap();
        assert_eq!(changer.presets().get("Whisper Lift").unwrap().semitones, 2.5);
        assert_eq!(changer.config().strategy, Strategy::Resample);
    }
}
