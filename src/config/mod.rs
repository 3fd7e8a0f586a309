//! Configuration module for oracle-agent
//!
//! This module handles loading and parsing of configuration files,
//! including environment variable expansion and path resolution.

mod file;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::agent::DEFAULT_COMMENT;

pub use file::{
    APP_NAME, CONFIG_ENV, ConfigFile, ConfigPath, config_search_paths, find_config_file,
    load_config, load_config_from_path_or_default,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the agent socket; a random name under the temp dir if unset
    /// Supports environment variable and tilde expansion
    #[serde(default)]
    pub socket: Option<String>,

    /// Private keys to serve
    #[serde(default)]
    pub keys: Vec<KeyConfig>,
}

/// A private key served by the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    /// Path to an unencrypted OpenSSH Ed25519 private key file
    /// Supports environment variable and tilde expansion
    pub path: String,

    /// Comment announced in identity listings
    #[serde(default = "default_comment")]
    pub comment: String,
}

fn default_comment() -> String {
    DEFAULT_COMMENT.to_string()
}

impl Config {
    /// Expand environment variables and tilde in all paths
    pub fn expand_paths(&self) -> crate::Result<ExpandedConfig> {
        let socket = self
            .socket
            .as_ref()
            .map(|p| expand_path(p).map(PathBuf::from))
            .transpose()?;

        let keys = self
            .keys
            .iter()
            .map(|key| {
                Ok(ExpandedKeyConfig {
                    path: PathBuf::from(expand_path(&key.path)?),
                    comment: key.comment.clone(),
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(ExpandedConfig { socket, keys })
    }
}

/// Configuration with all paths expanded
#[derive(Debug, Clone, Default)]
pub struct ExpandedConfig {
    pub socket: Option<PathBuf>,
    pub keys: Vec<ExpandedKeyConfig>,
}

/// Key configuration with expanded path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedKeyConfig {
    pub path: PathBuf,
    pub comment: String,
}

/// Expand environment variables and tilde in a path string
pub fn expand_path(path: &str) -> crate::Result<String> {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .map_err(|e| crate::Error::Config(format!("Failed to expand path '{}': {}", path, e)))
}
