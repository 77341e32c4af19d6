//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{CrossnpmError, CrossnpmResult};
use console::style;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config) -> CrossnpmResult<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => show(config),
        ConfigAction::Path => {
            println!("{}", ConfigManager::default_config_path().display());
            Ok(())
        }
        ConfigAction::Init { force } => init(force).await,
    }
}

fn show(config: &Config) -> CrossnpmResult<()> {
    let content = toml::to_string_pretty(config)?;
    print!("{}", content);
    Ok(())
}

async fn init(force: bool) -> CrossnpmResult<()> {
    let manager = ConfigManager::new();

    if manager.path().exists() && !force {
        return Err(CrossnpmError::ConfigInvalid {
            path: manager.path().to_path_buf(),
            reason: "already exists (use --force to overwrite)".to_string(),
        });
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Wrote default configuration to {}",
        style("✓").green(),
        manager.path().display()
    );
    Ok(())
}
