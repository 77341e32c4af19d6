//! Install command - offline install into an isolated prefix

use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::CrossnpmResult;
use crate::install::{InstallOptions, OfflineInstaller};
use console::style;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> CrossnpmResult<()> {
    let npm = super::npm_client(config);
    let cache_dir = super::cache_dir(args.cache_dir, config);

    let mut extra_args = config.install.extra_args.clone();
    extra_args.extend(args.install_args);

    let installer = OfflineInstaller::new(npm);
    let root = installer
        .install(&InstallOptions {
            source_dir: args.source,
            cache_dir,
            install_root: args.install_root,
            target_arch: args.target_arch,
            arch_override: args.arch.or_else(|| config.install.arch_override.clone()),
            install_dev: args.dev || config.install.dev,
            fallback_manifest: args
                .shrinkwrap
                .or_else(|| config.manifest.fallback.clone()),
            extra_args,
        })
        .await?;

    println!("{} Installed into {}", style("✓").green(), root.display());
    Ok(())
}
