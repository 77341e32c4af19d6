//! Configuration schema for crossnpm
//!
//! Configuration is stored at `~/.config/crossnpm/config.toml`; a
//! project-local `.crossnpm.toml` overrides individual keys.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry settings
    pub registry: RegistryConfig,

    /// Dependency cache settings
    pub cache: CacheConfig,

    /// Install settings
    pub install: InstallConfig,

    /// Lock manifest settings
    pub manifest: ManifestConfig,
}

/// Package registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry URL used during cache population
    pub url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "https://registry.npmjs.org".to_string(),
        }
    }
}

/// Dependency cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (defaults to the crossnpm state directory)
    pub dir: Option<PathBuf>,

    /// Keep the cache across builds. When false the cache is wiped
    /// before each fetch stage.
    pub retain: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            retain: true,
        }
    }
}

/// Offline install settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// npm binary to invoke
    pub npm: String,

    /// Include development-only dependencies
    pub dev: bool,

    /// Bypass architecture mapping with an explicit Node arch
    pub arch_override: Option<String>,

    /// Opaque pass-through flags for the install operation
    pub extra_args: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            npm: "npm".to_string(),
            dev: false,
            arch_override: None,
            extra_args: vec![],
        }
    }
}

/// Lock manifest settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Fallback shrinkwrap used when the source tree has no lock file
    pub fallback: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[registry]"));
        assert!(toml.contains("[cache]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.registry.url, "https://registry.npmjs.org");
        assert!(config.cache.retain);
        assert!(!config.install.dev);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [registry]
            url = "http://mirror.local:4873"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.registry.url, "http://mirror.local:4873");
        assert_eq!(config.install.npm, "npm"); // default preserved
    }
}
