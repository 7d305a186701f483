//! Project configuration stored under `.saga/config.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Saga configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values; a missing file is
/// the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SagaConfig {
    /// Wall-clock bound for each git subprocess invocation.
    pub git_timeout_secs: u64,

    /// Truncate captured git stdout/stderr beyond this many bytes.
    pub git_output_limit_bytes: usize,

    pub finder: FinderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FinderConfig {
    /// Minimum similarity score for a fuzzy match to be accepted.
    pub accept_threshold: f64,

    /// Candidates within this score window of the best are treated as tied.
    pub ambiguity_window: f64,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            accept_threshold: crate::core::finder::DEFAULT_ACCEPT_THRESHOLD,
            ambiguity_window: crate::core::finder::DEFAULT_AMBIGUITY_WINDOW,
        }
    }
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            git_timeout_secs: 60,
            git_output_limit_bytes: 100_000,
            finder: FinderConfig::default(),
        }
    }
}

impl SagaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.git_timeout_secs == 0 {
            return Err(anyhow!("git_timeout_secs must be > 0"));
        }
        if self.git_output_limit_bytes == 0 {
            return Err(anyhow!("git_output_limit_bytes must be > 0"));
        }
        if !(self.finder.accept_threshold > 0.0 && self.finder.accept_threshold <= 1.0) {
            return Err(anyhow!("finder.accept_threshold must be in (0, 1]"));
        }
        if !(self.finder.ambiguity_window >= 0.0 && self.finder.ambiguity_window < 1.0) {
            return Err(anyhow!("finder.ambiguity_window must be in [0, 1)"));
        }
        Ok(())
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SagaConfig::default()`.
pub fn load_config(path: &Path) -> Result<SagaConfig> {
    if !path.exists() {
        let cfg = SagaConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SagaConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, SagaConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "git_timeout_secs = 5\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.git_timeout_secs, 5);
        assert_eq!(
            cfg.git_output_limit_bytes,
            SagaConfig::default().git_output_limit_bytes
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "git_timeout_secs = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("git_timeout_secs"));
    }
}
