// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine configuration system

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up by [`EngineConfig::load`]
pub const CONFIG_FILE: &str = "zonekit.toml";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period before a scheduled recompute runs
    pub debounce_ms: u64,
    /// Fold rows on the rayon pool
    pub parallel_rows: bool,
    /// Tessellation of curved primitives without their own segment count
    pub mesh_segments: u32,
    /// Constructions per line in geo card output
    pub constructions_per_line: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            parallel_rows: true,
            mesh_segments: 24,
            constructions_per_line: 9,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `zonekit.toml` from the working directory if present, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// `ZONEKIT_DEBOUNCE_MS`, `ZONEKIT_PARALLEL_ROWS`, `ZONEKIT_MESH_SEGMENTS`.
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(ms) = env_parse("ZONEKIT_DEBOUNCE_MS") {
            self.debounce_ms = ms;
        }
        if let Some(parallel) = env_parse("ZONEKIT_PARALLEL_ROWS") {
            self.parallel_rows = parallel;
        }
        if let Some(segments) = env_parse("ZONEKIT_MESH_SEGMENTS") {
            self.mesh_segments = segments;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("zonekit.toml");
        let config = EngineConfig {
            debounce_ms: 50,
            parallel_rows: false,
            ..EngineConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.debounce_window(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "mesh_segments = 8\n").unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded.mesh_segments, 8);
        assert_eq!(loaded.debounce_ms, 200);
        assert!(loaded.parallel_rows);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("ZONEKIT_DEBOUNCE_MS", "15");
        std::env::set_var("ZONEKIT_PARALLEL_ROWS", "not-a-bool");
        let mut config = EngineConfig::default();
        config.apply_env_overrides();
        std::env::remove_var("ZONEKIT_DEBOUNCE_MS");
        std::env::remove_var("ZONEKIT_PARALLEL_ROWS");

        assert_eq!(config.debounce_ms, 15);
        assert!(config.parallel_rows);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "debounce_ms = \"soon\"\n").unwrap();
        assert!(EngineConfig::from_file(&path).is_err());
    }
}
