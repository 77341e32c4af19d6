//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Crossnpm - Offline npm staging for cross builds
///
/// Populates a network-isolated dependency cache from a pinned lock
/// manifest, installs offline into an isolated prefix and partitions the
/// result for the target architecture.
#[derive(Parser, Debug)]
#[command(name = "crossnpm")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CROSSNPM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .crossnpm.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// npm binary to invoke
    #[arg(long, global = true, env = "CROSSNPM_NPM")]
    pub npm: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: resolve, fetch, install, partition
    Build(BuildArgs),

    /// Populate the dependency cache from the lock manifest
    Fetch(FetchArgs),

    /// Offline install into an isolated prefix
    Install(InstallArgs),

    /// Partition an install root into a final prefix
    Partition(PartitionArgs),

    /// Print the Node.js architecture for a target architecture
    Arch(ArchArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Package source tree
    #[arg(short, long, default_value = ".")]
    pub source: PathBuf,

    /// Final output prefix
    #[arg(short = 'o', long)]
    pub prefix: PathBuf,

    /// Cross-build target architecture
    #[arg(short, long)]
    pub target_arch: String,

    /// Bypass architecture mapping with an explicit Node arch
    #[arg(long)]
    pub arch: Option<String>,

    /// Isolated install root (defaults to <prefix>.staging)
    #[arg(long)]
    pub install_root: Option<PathBuf>,

    /// Dependency cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Registry URL for cache population
    #[arg(long)]
    pub registry: Option<String>,

    /// Materialize from a directory of pre-fetched tarballs
    #[arg(long, conflicts_with = "registry")]
    pub tarballs: Option<PathBuf>,

    /// Fallback shrinkwrap when the source has no lock manifest
    #[arg(long)]
    pub shrinkwrap: Option<PathBuf>,

    /// Include development-only dependencies
    #[arg(long)]
    pub dev: bool,

    /// Wipe the cache before populating it
    #[arg(long)]
    pub wipe_cache: bool,

    /// Extra arguments passed through to npm install
    #[arg(last = true)]
    pub install_args: Vec<String>,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Package source tree
    #[arg(short, long, default_value = ".")]
    pub source: PathBuf,

    /// Dependency cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Registry URL for cache population
    #[arg(long)]
    pub registry: Option<String>,

    /// Materialize from a directory of pre-fetched tarballs
    #[arg(long, conflicts_with = "registry")]
    pub tarballs: Option<PathBuf>,

    /// Fallback shrinkwrap when the source has no lock manifest
    #[arg(long)]
    pub shrinkwrap: Option<PathBuf>,

    /// Wipe the cache before populating it
    #[arg(long)]
    pub wipe_cache: bool,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Package source tree
    #[arg(short, long, default_value = ".")]
    pub source: PathBuf,

    /// Isolated install root
    #[arg(long)]
    pub install_root: PathBuf,

    /// Cross-build target architecture
    #[arg(short, long)]
    pub target_arch: String,

    /// Bypass architecture mapping with an explicit Node arch
    #[arg(long)]
    pub arch: Option<String>,

    /// Dependency cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Fallback shrinkwrap when the source has no lock manifest
    #[arg(long)]
    pub shrinkwrap: Option<PathBuf>,

    /// Include development-only dependencies
    #[arg(long)]
    pub dev: bool,

    /// Extra arguments passed through to npm install
    #[arg(last = true)]
    pub install_args: Vec<String>,
}

/// Arguments for the partition command
#[derive(Parser, Debug)]
pub struct PartitionArgs {
    /// Install root produced by the install command
    pub install_root: PathBuf,

    /// Final output prefix
    pub prefix: PathBuf,
}

/// Arguments for the arch command
#[derive(Parser, Debug)]
pub struct ArchArgs {
    /// Cross-build target architecture string
    pub target_arch: String,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
