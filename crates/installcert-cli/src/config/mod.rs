//! Configuration file.
//!
//! Values here sit between the built-in defaults and the command line:
//! a flag always wins, then the environment, then this file.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent defaults read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Port used when `--port` is absent.
    pub port: Option<u16>,

    /// Key store passphrase.
    pub passphrase: Option<String>,

    /// Key store used when `--keystore` is absent.
    pub keystore: Option<PathBuf>,

    /// Connect and handshake timeout in seconds.
    pub timeout_secs: Option<u64>,

    /// Always back up before saving.
    pub backup: bool,
}

impl Config {
    /// Get the default config file path.
    pub fn path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "netradius", "installcert")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load from the default location, or defaults if there is no file.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;

        if config.timeout_secs == Some(0) {
            anyhow::bail!("invalid config file {}: timeout_secs must be at least 1", path.display());
        }

        Ok(config)
    }
}
