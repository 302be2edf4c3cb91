//! Configuration management for decision synthesis
//!
//! Repository-level settings live in `.sdp/config.toml`. Every field has a
//! default, so a missing file (or a partial one) is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Result, SdpError};

/// Repository-level configuration
///
/// Loaded from `.sdp/config.toml` in the repo root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdpConfig {
    /// Consultation and synthesis settings
    #[serde(default)]
    pub synthesis: SynthesisSettings,
}

/// Settings for a decision round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Per-agent consultation timeout
    #[serde(default = "default_consult_timeout_secs")]
    pub consult_timeout_secs: u64,

    /// Maximum agents consulted at the same time
    #[serde(default = "default_max_concurrent_agents")]
    pub max_concurrent_agents: usize,

    /// Shared deadline for a whole round (defaults to the consult timeout)
    #[serde(default)]
    pub round_deadline_secs: Option<u64>,
}

fn default_consult_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_agents() -> usize {
    5
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            consult_timeout_secs: default_consult_timeout_secs(),
            max_concurrent_agents: default_max_concurrent_agents(),
            round_deadline_secs: None,
        }
    }
}

impl SynthesisSettings {
    pub fn consult_timeout(&self) -> Duration {
        Duration::from_secs(self.consult_timeout_secs)
    }

    pub fn round_deadline(&self) -> Duration {
        Duration::from_secs(self.round_deadline_secs.unwrap_or(self.consult_timeout_secs))
    }
}

impl SdpConfig {
    /// Load configuration from `.sdp/config.toml` or use defaults
    pub fn load_or_default(repo_root: &Path) -> Result<Self> {
        let config_path = repo_root.join(".sdp/config.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content)
                .map_err(|e| SdpError::Config(format!("Failed to parse config file: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `.sdp/config.toml`
    pub fn write_default(repo_root: &Path) -> Result<()> {
        let config_dir = repo_root.join(".sdp");
        std::fs::create_dir_all(&config_dir)?;

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| SdpError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(config_dir.join("config.toml"), content)?;
        Ok(())
    }

    /// Reject settings no round could run with
    pub fn validate(&self) -> Result<()> {
        let synthesis = &self.synthesis;
        if synthesis.consult_timeout_secs == 0 {
            return Err(SdpError::Config(
                "synthesis.consult_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if synthesis.max_concurrent_agents == 0 {
            return Err(SdpError::Config(
                "synthesis.max_concurrent_agents must be greater than zero".to_string(),
            ));
        }
        if synthesis.round_deadline_secs == Some(0) {
            return Err(SdpError::Config(
                "synthesis.round_deadline_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SdpConfig::load_or_default(dir.path()).unwrap();

        assert_eq!(config, SdpConfig::default());
        assert_eq!(config.synthesis.consult_timeout(), Duration::from_secs(30));
        assert_eq!(config.synthesis.round_deadline(), Duration::from_secs(30));
        assert_eq!(config.synthesis.max_concurrent_agents, 5);
    }

    #[test]
    fn test_write_then_load_default() {
        let dir = TempDir::new().unwrap();
        SdpConfig::write_default(dir.path()).unwrap();

        assert!(dir.path().join(".sdp/config.toml").exists());
        let config = SdpConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config, SdpConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".sdp")).unwrap();
        std::fs::write(
            dir.path().join(".sdp/config.toml"),
            "[synthesis]\nconsult_timeout_secs = 5\nround_deadline_secs = 12\n",
        )
        .unwrap();

        let config = SdpConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.synthesis.consult_timeout(), Duration::from_secs(5));
        assert_eq!(config.synthesis.round_deadline(), Duration::from_secs(12));
        assert_eq!(config.synthesis.max_concurrent_agents, 5);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".sdp")).unwrap();
        std::fs::write(
            dir.path().join(".sdp/config.toml"),
            "[synthesis]\nmax_concurrent_agents = 0\n",
        )
        .unwrap();

        let err = SdpConfig::load_or_default(dir.path()).unwrap_err();
        assert!(matches!(err, SdpError::Config(_)));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".sdp")).unwrap();
        std::fs::write(dir.path().join(".sdp/config.toml"), "[synthesis\n").unwrap();

        let err = SdpConfig::load_or_default(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
