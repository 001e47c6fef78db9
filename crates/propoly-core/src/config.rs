//! Client configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Client configuration, loaded from .propoly/config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the simulator backend
    pub backend_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Speculatively fetch the next-age state after each commit
    #[serde(default = "default_true")]
    pub prefetch: bool,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_timeout_secs(),
            prefetch: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from a project directory (looks for .propoly/config.yaml)
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = Self::config_path(dir);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path(dir: &Path) -> PathBuf {
        dir.join(".propoly/config.yaml")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_config_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.prefetch);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".propoly");
        std::fs::create_dir_all(&config_dir).unwrap();
        let mut file = std::fs::File::create(config_dir.join("config.yaml")).unwrap();
        writeln!(file, "backend_url: https://sim.example.com").unwrap();
        writeln!(file, "prefetch: false").unwrap();

        let config = ClientConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.backend_url, "https://sim.example.com");
        assert!(!config.prefetch);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".propoly");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.yaml"), "backend_url: [oops").unwrap();

        assert!(ClientConfig::load_from_dir(dir.path()).is_err());
    }
}
