//! Shared command utilities

use anyhow::{Context, Result};
use rescue_core::EngineConfig;
use rescue_effects::InMemoryChainHandler;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Load the engine configuration.
///
/// When `path` does not exist the per-user file under the platform config
/// directory is tried before falling back to defaults.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let path = if path.exists() {
        path.to_path_buf()
    } else {
        user_config_path()
            .filter(|candidate| candidate.exists())
            .unwrap_or_else(|| path.to_path_buf())
    };
    EngineConfig::load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rescue").join("config.toml"))
}

/// Install the `tracing` subscriber. Logs go to stderr so `--json` output
/// stays parseable.
pub fn init_logging(verbose: bool, config: &EngineConfig) {
    let directive = if verbose {
        "debug".to_string()
    } else {
        config.log_filter.clone().unwrap_or_else(|| "info".to_string())
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Open a chain snapshot file.
pub fn open_chain(path: &Path) -> Result<Arc<InMemoryChainHandler>> {
    let chain = InMemoryChainHandler::from_file(path)
        .with_context(|| format!("failed to load chain snapshot {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        block = chain.snapshot().block_height(),
        entries = chain.snapshot().len(),
        "chain snapshot loaded"
    );
    Ok(Arc::new(chain))
}

/// Human or JSON output.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print `value` as pretty JSON.
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print an aligned `label: value` line.
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("{label:<18} {value}");
    }

    pub fn heading(&self, title: &str) {
        println!("=== {title} ===");
    }
}

/// Render an optional value, `-` when missing.
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "block_time_secs = 12").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.block_time_secs, 12);
    }

    #[test]
    fn test_open_chain_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("chain.json");
        let err = open_chain(&missing).unwrap_err();
        assert!(err.to_string().contains("chain.json"));
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some(3)), "3");
        assert_eq!(or_dash::<u32>(None), "-");
    }
}
