//! Build configuration
//!
//! Defaults describe the reference deployment: TIC-80 tiles, sprites and map
//! memory used as one contiguous 48 KiB block starting at 0x4000.

use crate::error::{Error, Result};
use crate::wavetable::{REFERENCE_FREQ, REFERENCE_NOTE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Total payload budget in bytes
pub const DEFAULT_BUDGET: usize = 49152;

/// Address at which the payload (and the pattern records) start
pub const DEFAULT_PATTERN_BASE: usize = 0x4000;

/// Cartridge chunk types
pub mod chunk {
    pub const TILES: u8 = 1;
    pub const SPRITES: u8 = 2;
    pub const MAP: u8 = 4;
    pub const CODE: u8 = 5;
}

/// Pattern record width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordFormat {
    /// `[note, sample, effect, param]`
    #[default]
    WithEffects,
    /// `[note, sample]`
    NotesOnly,
}

impl RecordFormat {
    /// Bytes per event record
    pub fn size(self) -> usize {
        match self {
            RecordFormat::WithEffects => 4,
            RecordFormat::NotesOnly => 2,
        }
    }
}

/// One named, fixed-capacity slice of the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub name: String,
    /// Cartridge chunk type
    pub tag: u8,
    /// Address the region is mapped at
    pub base: usize,
    pub capacity: usize,
}

impl RegionSpec {
    pub fn new(name: &str, tag: u8, base: usize, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            tag,
            base,
            capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Resynthesis frequency for an instrument whose base note is `reference_note`
    pub reference_freq: f64,
    /// Base note for instruments that are never played
    pub reference_note: u8,
    pub budget: usize,
    pub pattern_base: usize,
    pub record_format: RecordFormat,
    /// Regions in fill order
    pub regions: Vec<RegionSpec>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            reference_freq: REFERENCE_FREQ,
            reference_note: REFERENCE_NOTE,
            budget: DEFAULT_BUDGET,
            pattern_base: DEFAULT_PATTERN_BASE,
            record_format: RecordFormat::WithEffects,
            regions: vec![
                RegionSpec::new("TILES", chunk::TILES, 0x4000, 0x2000),
                RegionSpec::new("SPRITES", chunk::SPRITES, 0x6000, 0x2000),
                RegionSpec::new("MAP", chunk::MAP, 0x8000, 0x8000),
            ],
        }
    }
}

impl BuildConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            return Err(Error::Config("At least one region is required".into()));
        }
        if let Some(r) = self.regions.iter().find(|r| r.capacity == 0) {
            return Err(Error::Config(format!("Region '{}' has no capacity", r.name)));
        }
        if let Some(r) = self.regions.iter().find(|r| r.tag > 0x1F) {
            return Err(Error::Config(format!(
                "Region '{}' has chunk type {} (max 31)",
                r.name, r.tag
            )));
        }
        // Hops must be long enough to hold a period candidate at the lowest note
        let lowest = crate::wavetable::base_frequency(self.reference_freq, self.reference_note, 0);
        if !(lowest / 60.0 > crate::wavetable::period::MIN_PERIOD as f64) {
            return Err(Error::Config(format!(
                "Reference frequency {} Hz is too low to analyze",
                self.reference_freq
            )));
        }
        if self.reference_note >= 60 {
            return Err(Error::Config(format!(
                "Reference note {} is out of range",
                self.reference_note
            )));
        }
        let capacity: usize = self.regions.iter().map(|r| r.capacity).sum();
        if capacity < self.budget {
            return Err(Error::Config(format!(
                "Regions hold {} bytes, less than the {} byte budget",
                capacity, self.budget
            )));
        }
        if self.pattern_base + self.budget > 0x10000 {
            return Err(Error::Config("Payload does not fit in 64 KiB".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BuildConfig::default();
        config.validate().unwrap();
        let capacity: usize = config.regions.iter().map(|r| r.capacity).sum();
        assert_eq!(capacity, DEFAULT_BUDGET);
        assert_eq!(config.record_format.size(), 4);
    }

    #[test]
    fn test_partial_toml() {
        let config = BuildConfig::from_toml(
            r#"
reference_note = 24
record_format = "notes-only"
"#,
        )
        .unwrap();
        assert_eq!(config.reference_note, 24);
        assert_eq!(config.record_format, RecordFormat::NotesOnly);
        assert_eq!(config.budget, DEFAULT_BUDGET);
        assert_eq!(config.regions.len(), 3);
    }

    #[test]
    fn test_custom_regions() {
        let config = BuildConfig::from_toml(
            r#"
budget = 4096

[[regions]]
name = "TILES"
tag = 1
base = 16384
capacity = 4096
"#,
        )
        .unwrap();
        assert_eq!(config.regions, vec![RegionSpec::new("TILES", 1, 0x4000, 4096)]);
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            BuildConfig::from_toml("regions = []"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            BuildConfig::from_toml("reference_freq = 100.0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            BuildConfig::from_toml("budget = 100000"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            BuildConfig::from_toml("unknown_key = 1"),
            Err(Error::Config(_))
        ));
    }
}
