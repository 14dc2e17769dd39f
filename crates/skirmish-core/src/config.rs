//! Engine configuration.
//!
//! Every tunable rule number lives here. Values load from TOML; any field left
//! out of the file keeps its default.
//!
//! ```
//! use skirmish_core::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str("turn_seconds = 45\ncompetitive = true").unwrap();
//! assert_eq!(config.turn_seconds, 45);
//! assert!(config.competitive);
//! assert_eq!(config.base_actions, 1);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::unit::UnitCategory;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Action-mark caps per unit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkCaps {
    /// Cap for [`UnitCategory::Minion`].
    pub minion: u32,
    /// Cap for [`UnitCategory::Soldier`].
    pub soldier: u32,
    /// Cap for [`UnitCategory::Champion`].
    pub champion: u32,
}

impl Default for MarkCaps {
    fn default() -> Self {
        Self {
            minion: 2,
            soldier: 3,
            champion: 4,
        }
    }
}

impl MarkCaps {
    /// Cap for the given category.
    #[must_use]
    pub const fn for_category(&self, category: UnitCategory) -> u32 {
        match category {
            UnitCategory::Minion => self.minion,
            UnitCategory::Soldier => self.soldier,
            UnitCategory::Champion => self.champion,
        }
    }
}

/// Rule configuration shared by every battle an orchestrator runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds on the countdown when a turn is (re-)armed.
    pub turn_seconds: u32,
    /// Competitive mode: exhausted units may still be nominated, at a cost.
    pub competitive: bool,
    /// Extra actions granted to an exhausted unit nominated in competitive mode.
    pub overdrive_bonus_actions: u32,
    /// Self-damage taken by that unit.
    pub overdrive_self_damage: u32,
    /// Actions every unit receives when its turn begins.
    pub base_actions: u32,
    /// Action-mark caps.
    pub mark_caps: MarkCaps,
    /// Minimum strike damage that clears a corpse from its cell.
    pub corpse_clear_threshold: u32,
    /// Vision radius before the focus bonus.
    pub base_vision: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turn_seconds: 30,
            competitive: false,
            overdrive_bonus_actions: 1,
            overdrive_self_damage: 3,
            base_actions: 1,
            mark_caps: MarkCaps::default(),
            corpse_clear_threshold: 3,
            base_vision: 4,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text does not match the schema.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn nested_caps_merge_with_defaults() {
        let config = EngineConfig::from_toml_str("[mark_caps]\nchampion = 6\n").unwrap();
        assert_eq!(config.mark_caps.champion, 6);
        assert_eq!(config.mark_caps.minion, 2);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("turn_seconds = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            EngineConfig::load("/definitely/not/here.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
