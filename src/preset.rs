//! Named voice presets.

use serde::{Deserialize, Serialize};

use crate::core::{cents_to_semitones, Strategy};
use crate::error::PitchError;

/// A named pitch offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    /// Signed offset; positive raises the pitch.
    pub semitones: f64,
    /// Overrides the configured default strategy for this preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
}

impl Preset {
    pub fn new(name: impl Into<String>, semitones: f64) -> Self {
        Self {
            name: name.into(),
            semitones,
            strategy: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// Preset as written in a configuration file: the offset is given either in
/// semitones or in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semitones: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cents: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
}

impl TryFrom<PresetEntry> for Preset {
    type Error = PitchError;

    fn try_from(entry: PresetEntry) -> Result<Self, Self::Error> {
        let semitones = match (entry.semitones, entry.cents) {
            (Some(semitones), None) => semitones,
            (None, Some(cents)) => cents_to_semitones(cents),
            _ => {
                return Err(PitchError::InvalidParameter(format!(
                    "preset {:?} must set exactly one of 'semitones' or 'cents'",
                    entry.name
                )))
            }
        };
        Ok(Preset {
            name: entry.name,
            semitones,
            strategy: entry.strategy,
        })
    }
}

/// Presets observed in the voice changer this engine backs.
const CANONICAL_PRESETS: [(&str, f64); 7] = [
    ("Man to Woman", 4.0),
    ("Woman to Man", -4.0),
    ("Baby Voice", 6.0),
    ("Deep Voice", -6.0),
    ("Child Girl to Child Boy", -1.0),
    ("Child Boy to Child Girl", 1.0),
    ("Child to Big Adult", -6.0),
];

/// Mapping from unique preset name to pitch offset.
///
/// Listing order is registration order; re-registering a name replaces the
/// earlier entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetTable {
    presets: Vec<Preset>,
}

impl PresetTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the canonical voice presets.
    pub fn canonical() -> Self {
        Self {
            presets: CANONICAL_PRESETS
                .iter()
                .map(|&(name, semitones)| Preset::new(name, semitones))
                .collect(),
        }
    }

    /// Registers `name` with an offset in semitones.
    ///
    /// # Errors
    /// Returns [`PitchError::InvalidParameter`] if the name is blank or the
    /// offset is not finite.
    pub fn register(&mut self, name: impl Into<String>, semitones: f64) -> Result<(), PitchError> {
        self.register_preset(Preset::new(name, semitones))
    }

    /// Registers `name` with an offset in cents.
    pub fn register_cents(&mut self, name: impl Into<String>, cents: f64) -> Result<(), PitchError> {
        self.register(name, cents_to_semitones(cents))
    }

    /// Registers a fully specified preset.
    pub fn register_preset(&mut self, preset: Preset) -> Result<(), PitchError> {
        if preset.name.trim().is_empty() {
            return Err(PitchError::InvalidParameter(
                "preset name must not be empty".to_string(),
            ));
        }
        if !preset.semitones.is_finite() {
            return Err(PitchError::InvalidParameter(format!(
                "preset {:?} has non-finite offset {}",
                preset.name, preset.semitones
            )));
        }
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
        Ok(())
    }

    /// Registers every entry, stopping at the first invalid one.
    pub fn extend_entries(
        &mut self,
        entries: impl IntoIterator<Item = PresetEntry>,
    ) -> Result<(), PitchError> {
        for entry in entries {
            self.register_preset(Preset::try_from(entry)?)?;
        }
        Ok(())
    }

    /// Looks up a preset by exact name.
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Looks up a preset, failing with [`PitchError::UnknownPreset`].
    pub fn lookup(&self, name: &str) -> Result<&Preset, PitchError> {
        self.get(name)
            .ok_or_else(|| PitchError::UnknownPreset(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
