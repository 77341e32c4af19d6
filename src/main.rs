//! Crossnpm - Offline npm staging for cross builds
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use crossnpm::cli::{Cli, Commands};
use crossnpm::config::ConfigManager;
use crossnpm::error::CrossnpmResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CrossnpmResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("crossnpm=warn"),
        1 => EnvFilter::new("crossnpm=info"),
        _ => EnvFilter::new("crossnpm=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Arch mapping needs no configuration
    if let Commands::Arch(args) = cli.command {
        return crossnpm::cli::commands::arch(args);
    }

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| crossnpm::error::CrossnpmError::io("getting current directory", e))?;
        let found = ConfigManager::find_local_config(&cwd);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    let mut config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // CLI npm override wins over any config file
    if let Some(npm) = cli.npm {
        config.install.npm = npm;
    }

    // Ensure state directories exist
    ConfigManager::ensure_state_dirs().await?;

    // Dispatch to command
    match cli.command {
        Commands::Arch(_) => unreachable!("Arch handled above"),
        Commands::Build(args) => crossnpm::cli::commands::build(args, &config).await,
        Commands::Fetch(args) => crossnpm::cli::commands::fetch(args, &config).await,
        Commands::Install(args) => crossnpm::cli::commands::install(args, &config).await,
        Commands::Partition(args) => crossnpm::cli::commands::partition(args),
        Commands::Config(args) => crossnpm::cli::commands::config(args, &config).await,
    }
}
