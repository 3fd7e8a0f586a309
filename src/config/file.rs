//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use super::Config;

/// Configuration file wrapper with path information
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Path where the configuration was loaded from; empty for defaults
    pub path: PathBuf,

    /// The parsed configuration
    pub config: Config,
}

/// Configuration file search path with description
#[derive(Debug, Clone)]
pub struct ConfigPath {
    /// The actual file path
    pub path: PathBuf,
    /// Human-readable description for display
    pub description: &'static str,
}

/// Standard configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application name for directory paths
pub const APP_NAME: &str = "oracle-agent";

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "ORACLE_AGENT_CONFIG";

/// Get all configuration search paths with descriptions (in priority order)
///
/// Search order:
/// 1. `$XDG_CONFIG_HOME/oracle-agent/config.toml` (if env var set)
/// 2. `~/.config/oracle-agent/config.toml`
/// 3. `~/.oracle-agent/config.toml`
/// 4. `~/.oracle-agent.toml`
/// 5. `/etc/oracle-agent/config.toml`
pub fn config_search_paths() -> Vec<ConfigPath> {
    let mut paths = Vec::new();

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        paths.push(ConfigPath {
            path: PathBuf::from(xdg).join(APP_NAME).join(CONFIG_FILE_NAME),
            description: "$XDG_CONFIG_HOME/oracle-agent/config.toml",
        });
    }

    if let Some(home) = dirs::home_dir() {
        let dotconfig = home.join(".config").join(APP_NAME).join(CONFIG_FILE_NAME);
        if !paths.iter().any(|p| p.path == dotconfig) {
            paths.push(ConfigPath {
                path: dotconfig,
                description: "~/.config/oracle-agent/config.toml",
            });
        }
        paths.push(ConfigPath {
            path: home.join(format!(".{}", APP_NAME)).join(CONFIG_FILE_NAME),
            description: "~/.oracle-agent/config.toml",
        });
        paths.push(ConfigPath {
            path: home.join(format!(".{}.toml", APP_NAME)),
            description: "~/.oracle-agent.toml",
        });
    }

    paths.push(ConfigPath {
        path: PathBuf::from("/etc").join(APP_NAME).join(CONFIG_FILE_NAME),
        description: "/etc/oracle-agent/config.toml",
    });

    paths
}

/// Find the configuration file in standard locations
///
/// Returns `None` if no configuration file is found.
pub fn find_config_file() -> Option<PathBuf> {
    for cp in config_search_paths() {
        if cp.path.is_file() {
            tracing::info!(path = %cp.path.display(), "Found configuration file");
            return Some(cp.path);
        }
    }

    tracing::debug!("No configuration file found in standard locations");
    None
}

/// Load configuration from the specified path
pub fn load_config(path: &Path) -> crate::Result<ConfigFile> {
    tracing::debug!(path = %path.display(), "Loading configuration");

    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read configuration file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse configuration file '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(ConfigFile {
        path: path.to_path_buf(),
        config,
    })
}

/// Load an explicit configuration file, or the first one found in the
/// standard locations, or the defaults
pub fn load_config_from_path_or_default(path: Option<&Path>) -> crate::Result<ConfigFile> {
    if let Some(p) = path {
        return load_config(p);
    }
    match find_config_file() {
        Some(found) => load_config(&found),
        None => {
            tracing::debug!("No configuration file found, using defaults");
            Ok(ConfigFile {
                path: PathBuf::new(),
                config: Config::default(),
            })
        }
    }
}
