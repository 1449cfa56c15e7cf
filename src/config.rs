use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::search::params::Tunables;

/// Engine-wide settings. Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub threads: usize,
    pub hash_mb: usize,
    /// Book moves are ignored from this game ply on.
    pub book_max_ply: u16,
    pub move_overhead_ms: u64,
    pub tunables: Tunables,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { threads: 1, hash_mb: 16, book_max_ply: 16, move_overhead_ms: 10, tunables: Tunables::default() }
    }
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> { Ok(serde_json::to_string_pretty(self)?) }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 { return Err(ConfigError::NotPositive("threads")); }
        if self.hash_mb == 0 { return Err(ConfigError::NotPositive("hash_mb")); }
        self.tunables.validate()
    }

    pub fn move_overhead(&self) -> Duration { Duration::from_millis(self.move_overhead_ms) }
}
