//! Configuration management for crossnpm

pub mod schema;

pub use schema::Config;

use crate::error::{CrossnpmError, CrossnpmResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Project-local configuration filename, discovered upward from the
/// working directory
pub const LOCAL_CONFIG_FILE: &str = ".crossnpm.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crossnpm")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crossnpm")
    }

    /// Default dependency cache directory
    pub fn default_cache_dir() -> PathBuf {
        Self::state_dir().join("cache")
    }

    /// Find a project-local config file, walking up from `start`
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(d) = dir {
            let candidate = d.join(LOCAL_CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = d.parent();
        }
        None
    }

    /// Load configuration, using defaults when no file exists
    pub async fn load(&self) -> CrossnpmResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> CrossnpmResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CrossnpmError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CrossnpmError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the global config with a project-local file merged over it
    pub async fn load_merged(&self, local: Option<&Path>) -> CrossnpmResult<Config> {
        let Some(local) = local else {
            return self.load().await;
        };

        let global_content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path).await.map_err(|e| {
                CrossnpmError::io(
                    format!("reading config from {}", self.config_path.display()),
                    e,
                )
            })?
        } else {
            String::new()
        };
        let local_content = fs::read_to_string(local)
            .await
            .map_err(|e| CrossnpmError::io(format!("reading config from {}", local.display()), e))?;

        let mut merged: toml::Value = toml::from_str(&global_content)?;
        let overlay: toml::Value = toml::from_str(&local_content)?;
        merge_values(&mut merged, overlay);

        merged
            .try_into()
            .map_err(|e: toml::de::Error| CrossnpmError::ConfigInvalid {
                path: local.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> CrossnpmResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CrossnpmError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> CrossnpmResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CrossnpmError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure the state directories exist
    pub async fn ensure_state_dirs() -> CrossnpmResult<()> {
        for dir in [Self::state_dir(), Self::default_cache_dir()] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| CrossnpmError::io(format!("creating directory {}", dir.display()), e))?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively merge `overlay` tables into `base`; non-table values in
/// the overlay replace the base value
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
