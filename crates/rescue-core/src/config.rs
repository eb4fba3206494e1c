//! Engine configuration.
//!
//! Loaded from TOML, overridden by `RESCUE_*` environment variables, then
//! validated. A missing file is not an error; defaults apply.

use crate::errors::{RescueError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "RESCUE_";

/// Seconds per block on the target chain.
pub const DEFAULT_BLOCK_TIME_SECS: u64 = 6;

/// Local countdown tick period.
pub const DEFAULT_COUNTDOWN_TICK_MS: u64 = 1000;

/// Configuration for the recovery engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds per block, used to turn remaining blocks into a countdown
    pub block_time_secs: u64,
    /// Period of the local countdown decrement
    pub countdown_tick_ms: u64,
    /// `tracing` filter directive for binaries
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_time_secs: DEFAULT_BLOCK_TIME_SECS,
            countdown_tick_ms: DEFAULT_COUNTDOWN_TICK_MS,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    /// Load from `path` (defaults when the file does not exist), apply the
    /// process environment, and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RescueError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Merge `RESCUE_*` variables from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Merge `RESCUE_*` variables from an explicit iterator.
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                self.set_from_string(&name.to_lowercase(), &value)?;
            }
        }
        Ok(())
    }

    /// Set a single field by name. Unknown names are ignored so unrelated
    /// `RESCUE_*` variables do not break startup.
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "block_time_secs" => self.block_time_secs = parse_u64(key, value)?,
            "countdown_tick_ms" => self.countdown_tick_ms = parse_u64(key, value)?,
            "log_filter" => self.log_filter = Some(value.to_string()),
            _ => tracing::trace!(key, "ignoring unknown config key"),
        }
        Ok(())
    }

    /// Validate field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.block_time_secs == 0 {
            return Err(RescueError::config("block_time_secs must be greater than 0"));
        }
        if self.countdown_tick_ms == 0 {
            return Err(RescueError::config("countdown_tick_ms must be greater than 0"));
        }
        Ok(())
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| RescueError::config(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.block_time_secs, 6);
        assert_eq!(config.countdown_tick_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("block_time_secs = 12\n").unwrap();
        assert_eq!(config.block_time_secs, 12);
        assert_eq!(config.countdown_tick_ms, DEFAULT_COUNTDOWN_TICK_MS);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::default();
        config
            .merge_with_vars(vec![
                ("RESCUE_BLOCK_TIME_SECS".to_string(), "2".to_string()),
                ("RESCUE_LOG_FILTER".to_string(), "debug".to_string()),
                ("PATH".to_string(), "/bin".to_string()),
            ])
            .unwrap();
        assert_eq!(config.block_time_secs, 2);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_bad_env_value_is_config_error() {
        let mut config = EngineConfig::default();
        let err = config
            .merge_with_vars(vec![(
                "RESCUE_COUNTDOWN_TICK_MS".to_string(),
                "soon".to_string(),
            )])
            .unwrap_err();
        assert!(matches!(err, RescueError::Config { .. }));
    }

    #[test]
    fn test_zero_block_time_rejected() {
        let config = EngineConfig {
            block_time_secs: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "countdown_tick_ms = 250").unwrap();
        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.countdown_tick_ms, 250);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.block_time_secs, DEFAULT_BLOCK_TIME_SECS);
    }
}
