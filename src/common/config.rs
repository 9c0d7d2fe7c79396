//! Configuration file handling

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Installed adapter packages, keyed by debug type
    #[serde(default)]
    pub adapters: HashMap<String, AdapterInstall>,

    /// Wire-level limits
    #[serde(default)]
    pub limits: Limits,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// An installed adapter package described by a manifest on disk
#[derive(Debug, Deserialize, Clone)]
pub struct AdapterInstall {
    /// Directory holding the adapter manifest and its program files
    pub install_root: PathBuf,
}

/// Wire-level limits
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Limits {
    /// Maximum accepted frame payload size in megabytes
    #[serde(default = "default_max_message_mb")]
    pub max_message_mb: usize,
}

impl Limits {
    /// Maximum accepted frame payload size in bytes
    pub fn max_message_bytes(&self) -> usize {
        self.max_message_mb * 1024 * 1024
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_mb: default_max_message_mb(),
        }
    }
}

fn default_max_message_mb() -> usize {
    100
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Timeouts {
    /// Timeout for connecting to a `debugServer` endpoint
    #[serde(default = "default_connect")]
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect(),
        }
    }
}

fn default_connect() -> u64 {
    10
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Looks for `config.toml` in the platform config directory
    /// (e.g. `~/.config/dap-bridge/` on Linux). A missing file yields
    /// the defaults.
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&text).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

/// Default path of the configuration file, if a home directory is known
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dap-bridge")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.limits.max_message_mb, 100);
        assert_eq!(config.timeouts.connect_secs, 10);
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn parses_adapter_installs() {
        let config: Config = toml::from_str(
            r#"
            [limits]
            max_message_mb = 16

            [adapters.node]
            install_root = "/opt/adapters/node"
            "#,
        )
        .unwrap();

        assert_eq!(config.limits.max_message_bytes(), 16 * 1024 * 1024);
        assert_eq!(
            config.adapters["node"].install_root,
            PathBuf::from("/opt/adapters/node")
        );
    }
}
