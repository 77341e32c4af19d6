//! Fetch command - populate the dependency cache

use crate::cache::{self, NpmRegistrySource, PackageSource, PopulateSummary, TarballDirSource};
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::CrossnpmResult;
use crate::manifest::{self, Shrinkwrap};
use crate::npm::NpmClient;
use console::style;
use std::path::Path;
use tracing::debug;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> CrossnpmResult<()> {
    let npm = super::npm_client(config);
    let cache_dir = super::cache_dir(args.cache_dir.clone(), config);

    let fallback = args
        .shrinkwrap
        .clone()
        .or_else(|| config.manifest.fallback.clone());
    let resolved = manifest::resolve(&args.source, fallback.as_deref())?;
    let result = populate(&args, config, &npm, &cache_dir, resolved.path()).await;

    // Restore the source tree whether or not the populate succeeded
    let cleanup = resolved.cleanup();
    let summary = result?;
    cleanup?;

    let dev_note = if summary.dev_packages > 0 {
        format!(" ({} dev-only)", summary.dev_packages)
    } else {
        String::new()
    };
    println!(
        "{} Cached {} packages{} in {}",
        style("✓").green(),
        summary.packages,
        dev_note,
        cache_dir.display()
    );
    Ok(())
}

async fn populate(
    args: &FetchArgs,
    config: &Config,
    npm: &NpmClient,
    cache_dir: &Path,
    manifest_path: &Path,
) -> CrossnpmResult<PopulateSummary> {
    let shrinkwrap = Shrinkwrap::load(manifest_path)?;

    if args.wipe_cache || !config.cache.retain {
        cache::clear(cache_dir).await?;
    }

    let source: Box<dyn PackageSource> = match args.tarballs {
        Some(ref dir) => {
            debug!("Materializing from tarball directory {}", dir.display());
            Box::new(TarballDirSource::new(npm.clone(), dir.clone()))
        }
        None => {
            let registry = args
                .registry
                .clone()
                .unwrap_or_else(|| config.registry.url.clone());
            Box::new(NpmRegistrySource::new(npm.clone(), Some(registry)))
        }
    };

    cache::populate(&shrinkwrap, source.as_ref(), cache_dir).await
}
