// Analysis configuration.
//
// Loaded from JSON. Every field has a default, so a partial file (or `{}`)
// is a valid config. `validate()` is called by `load`/`from_json` and by the
// catalog pass; it rejects settings that would break detector invariants.

use crate::error::{Error, Result};
use crate::pitch::Modulus;
use crate::rotation::{MIN_ROTATION_LENGTH, RotationStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub strategy: RotationStrategy,
    /// Shortest interval vector considered. Values below 3 are rejected.
    pub min_length: usize,
    /// Run the all-pairs scan on the rayon pool.
    pub parallel: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::default(),
            min_length: MIN_ROTATION_LENGTH,
            parallel: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexachordConfig {
    pub enabled: bool,
    /// Also feed each half's own class back into the catalog.
    pub include_halves: bool,
}

impl Default for HexachordConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            include_halves: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub modulus: Modulus,
    pub rotation: RotationConfig,
    pub hexachords: HexachordConfig,
    /// Run form-level rotation detection after the class-level scan.
    pub form_rotations: bool,
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rotation.min_length < MIN_ROTATION_LENGTH {
            return Err(Error::Config(format!(
                "rotation.min_length must be at least {MIN_ROTATION_LENGTH}, got {}",
                self.rotation.min_length
            )));
        }
        Ok(())
    }
}
