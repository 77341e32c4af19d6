//! Build command - run the full pipeline

use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::error::CrossnpmResult;
use crate::pipeline::{Pipeline, PipelineOptions};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> CrossnpmResult<()> {
    let npm = super::npm_client(config);
    let opts = pipeline_options(args, config);
    debug!("Pipeline options: {:?}", opts);

    let pb = create_progress_bar(&format!(
        "Building {} for {}...",
        opts.source_dir.display(),
        opts.target_arch
    ));

    let pipeline = Pipeline::new(npm, opts);
    let report = match pipeline.run().await {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            if let Some(stage) = e.stage() {
                eprintln!("{} Failed in {} stage", style("✗").red(), style(stage).bold());
            }
            return Err(e);
        }
    };

    pb.finish_and_clear();

    println!(
        "{} Built {} ({} packages cached, {} native addons)",
        style("✓").green(),
        style(report.final_prefix.display()).cyan(),
        report.packages_cached,
        report.partition.native_modules
    );
    Ok(())
}

fn pipeline_options(args: BuildArgs, config: &Config) -> PipelineOptions {
    let cache_dir = super::cache_dir(args.cache_dir, config);
    let install_root = args
        .install_root
        .unwrap_or_else(|| args.prefix.with_extension("staging"));

    let mut extra_install_args = config.install.extra_args.clone();
    extra_install_args.extend(args.install_args);

    PipelineOptions {
        source_dir: args.source,
        cache_dir,
        install_root,
        final_prefix: args.prefix,
        registry: Some(
            args.registry
                .unwrap_or_else(|| config.registry.url.clone()),
        ),
        tarball_dir: args.tarballs,
        target_arch: args.target_arch,
        arch_override: args.arch.or_else(|| config.install.arch_override.clone()),
        install_dev: args.dev || config.install.dev,
        fallback_manifest: args
            .shrinkwrap
            .or_else(|| config.manifest.fallback.clone()),
        extra_install_args,
        retain_cache: config.cache.retain && !args.wipe_cache,
    }
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
