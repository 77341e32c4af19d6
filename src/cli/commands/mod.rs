//! CLI command implementations

pub mod arch;
pub mod build;
pub mod config;
pub mod fetch;
pub mod install;
pub mod partition;

pub use arch::execute as arch;
pub use build::execute as build;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use partition::execute as partition;

use crate::config::{Config, ConfigManager};
use crate::npm::NpmClient;
use std::path::PathBuf;

/// npm client from configuration
pub(crate) fn npm_client(config: &Config) -> NpmClient {
    NpmClient::with_program(config.install.npm.clone())
}

/// Cache directory: CLI flag, then config, then the state default
pub(crate) fn cache_dir(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.or_else(|| config.cache.dir.clone())
        .unwrap_or_else(ConfigManager::default_cache_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_dir_prefers_flag() {
        let mut config = Config::default();
        config.cache.dir = Some(PathBuf::from("/from-config"));

        let dir = cache_dir(Some(PathBuf::from("/from-flag")), &config);
        assert_eq!(dir, PathBuf::from("/from-flag"));

        let dir = cache_dir(None, &config);
        assert_eq!(dir, PathBuf::from("/from-config"));
    }

    #[test]
    fn cache_dir_falls_back_to_state_default() {
        let config = Config::default();
        let dir = cache_dir(None, &config);
        assert!(dir.ends_with("crossnpm/cache"));
    }
}
