//! Host configuration.
//!
//! ```toml
//! tick_millis = 1000
//! event_capacity = 256
//! snapshot_dir = "/var/lib/skirmish"
//!
//! [engine]
//! turn_seconds = 30
//! competitive = false
//!
//! [ai]
//! max_units = 4
//! max_millis = 200
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skirmish_core::{ConfigError, EngineConfig};

/// Per-turn limits for AI decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnBudget {
    /// Most candidate units the policy evaluates in one turn.
    pub max_units: usize,
    /// Wall-clock limit for planning, in milliseconds.
    pub max_millis: u64,
}

impl Default for TurnBudget {
    fn default() -> Self {
        Self {
            max_units: 4,
            max_millis: 200,
        }
    }
}

impl TurnBudget {
    /// The wall-clock limit.
    #[must_use]
    pub fn max_wall(&self) -> Duration {
        Duration::from_millis(self.max_millis)
    }
}

/// Everything the host needs to run battles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Rules.
    pub engine: EngineConfig,
    /// Countdown period in milliseconds. One period is one second of turn time.
    pub tick_millis: u64,
    /// Buffered events per battle before slow subscribers start lagging.
    pub event_capacity: usize,
    /// Where the JSON snapshot store writes. `None` keeps snapshots in memory.
    pub snapshot_dir: Option<PathBuf>,
    /// AI limits.
    pub ai: TurnBudget,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            tick_millis: 1000,
            event_capacity: 256,
            snapshot_dir: None,
            ai: TurnBudget::default(),
        }
    }
}

impl HostConfig {
    /// The countdown period.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

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
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
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
    fn empty_file_is_all_defaults() {
        assert_eq!(HostConfig::from_toml_str("").unwrap(), HostConfig::default());
    }

    #[test]
    fn nested_tables_override_fields() {
        let config = HostConfig::from_toml_str(
            "tick_millis = 50\nsnapshot_dir = \"/tmp/snaps\"\n[engine]\nturn_seconds = 10\n[ai]\nmax_units = 1\n",
        )
        .unwrap();
        assert_eq!(config.tick_period(), Duration::from_millis(50));
        assert_eq!(config.engine.turn_seconds, 10);
        assert_eq!(config.engine.base_actions, 1);
        assert_eq!(config.ai.max_units, 1);
        assert_eq!(config.ai.max_millis, 200);
        assert_eq!(config.snapshot_dir, Some(PathBuf::from("/tmp/snaps")));
    }
}
