//! The build pipeline: resolve, fetch, install, partition
//!
//! Stages run strictly in order with no overlap; the first failure aborts
//! the whole pipeline. There is no checkpoint or resume - a build either
//! produces a complete final prefix or fails with the stage and reason.

use crate::cache::{self, NpmRegistrySource, PackageSource, TarballDirSource};
use crate::error::CrossnpmResult;
use crate::install::{InstallOptions, OfflineInstaller};
use crate::manifest::{self, Shrinkwrap};
use crate::npm::NpmClient;
use crate::partition::{self, PartitionSummary};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Ordered pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Fetch,
    Install,
    Partition,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolve => "resolve",
            Self::Fetch => "fetch",
            Self::Install => "install",
            Self::Partition => "partition",
        };
        write!(f, "{}", name)
    }
}

/// Structured options for one full build
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub source_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub install_root: PathBuf,
    pub final_prefix: PathBuf,
    /// Registry for cache materialization
    pub registry: Option<String>,
    /// Materialize from pre-fetched tarballs instead of the registry
    pub tarball_dir: Option<PathBuf>,
    pub target_arch: String,
    pub arch_override: Option<String>,
    pub install_dev: bool,
    pub fallback_manifest: Option<PathBuf>,
    pub extra_install_args: Vec<String>,
    /// Keep the cache across builds; when false it is wiped per build
    pub retain_cache: bool,
}

/// What a completed pipeline produced
#[derive(Debug)]
pub struct PipelineReport {
    pub packages_cached: usize,
    pub install_root: PathBuf,
    pub final_prefix: PathBuf,
    pub partition: PartitionSummary,
}

/// Sequential build pipeline over one source tree
pub struct Pipeline {
    npm: NpmClient,
    opts: PipelineOptions,
}

impl Pipeline {
    pub fn new(npm: NpmClient, opts: PipelineOptions) -> Self {
        Self { npm, opts }
    }

    /// Run all stages in order, short-circuiting on the first failure
    pub async fn run(&self) -> CrossnpmResult<PipelineReport> {
        // Stage 1: resolve. Fails before any network or install work
        // when no pinned manifest can be located.
        info!("Stage {}: locating lock manifest", Stage::Resolve);
        let resolved = manifest::resolve(
            &self.opts.source_dir,
            self.opts.fallback_manifest.as_deref(),
        )?;
        let shrinkwrap = match Shrinkwrap::load(resolved.path()) {
            Ok(s) => s,
            Err(e) => {
                // A materialized fallback copy must not linger after a
                // failed build either
                let _ = resolved.cleanup();
                return Err(e);
            }
        };

        let result = self.run_from_fetch(&shrinkwrap).await;

        // The installer saw the manifest as already present; removing a
        // materialized copy is this function's responsibility.
        let cleanup = resolved.cleanup();
        let report = result?;
        cleanup?;

        Ok(report)
    }

    async fn run_from_fetch(&self, shrinkwrap: &Shrinkwrap) -> CrossnpmResult<PipelineReport> {
        // Stage 2: fetch
        info!("Stage {}: populating dependency cache", Stage::Fetch);
        if !self.opts.retain_cache {
            cache::clear(&self.opts.cache_dir).await?;
        }
        let source = self.package_source();
        let cached = cache::populate(shrinkwrap, source.as_ref(), &self.opts.cache_dir).await?;

        // Stage 3: install
        info!("Stage {}: offline install", Stage::Install);
        let installer = OfflineInstaller::new(self.npm.clone());
        let install_root = installer
            .install(&InstallOptions {
                source_dir: self.opts.source_dir.clone(),
                cache_dir: self.opts.cache_dir.clone(),
                install_root: self.opts.install_root.clone(),
                target_arch: self.opts.target_arch.clone(),
                arch_override: self.opts.arch_override.clone(),
                install_dev: self.opts.install_dev,
                // The manifest is present in the source tree at this
                // point; cleanup of a materialized copy happens in run()
                fallback_manifest: None,
                extra_args: self.opts.extra_install_args.clone(),
            })
            .await?;

        // Stage 4: partition
        info!("Stage {}: partitioning artifacts", Stage::Partition);
        let summary = partition::partition(&install_root, &self.opts.final_prefix)?;

        Ok(PipelineReport {
            packages_cached: cached.packages,
            install_root,
            final_prefix: self.opts.final_prefix.clone(),
            partition: summary,
        })
    }

    fn package_source(&self) -> Box<dyn PackageSource> {
        match self.opts.tarball_dir {
            Some(ref dir) => Box::new(TarballDirSource::new(self.npm.clone(), dir.clone())),
            None => Box::new(NpmRegistrySource::new(
                self.npm.clone(),
                self.opts.registry.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrossnpmError;
    use tempfile::TempDir;

    fn options(source: &TempDir, work: &TempDir) -> PipelineOptions {
        PipelineOptions {
            source_dir: source.path().to_path_buf(),
            cache_dir: work.path().join("cache"),
            install_root: work.path().join("root"),
            final_prefix: work.path().join("prefix"),
            registry: None,
            tarball_dir: None,
            target_arch: "x86_64".to_string(),
            arch_override: None,
            install_dev: false,
            fallback_manifest: None,
            extra_install_args: vec![],
            retain_cache: true,
        }
    }

    #[test]
    fn stage_names() {
        let names: Vec<String> = [Stage::Resolve, Stage::Fetch, Stage::Install, Stage::Partition]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["resolve", "fetch", "install", "partition"]);
    }

    #[tokio::test]
    async fn missing_manifest_aborts_before_any_work() {
        let source = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let opts = options(&source, &work);
        let cache_dir = opts.cache_dir.clone();

        // npm does not even need to exist: the pipeline must fail in the
        // resolve stage before cache or install work is attempted
        let pipeline = Pipeline::new(NpmClient::with_program("definitely-not-npm-xyz"), opts);
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, CrossnpmError::ManifestMissing(_)));
        assert_eq!(err.stage(), Some("resolve"));
        assert!(!cache_dir.exists());
    }

    #[tokio::test]
    async fn fetch_failure_aborts_before_install() {
        let source = TempDir::new().unwrap();
        std::fs::write(
            source.path().join("npm-shrinkwrap.json"),
            r#"{"dependencies": {"left-pad": {"version": "1.3.0"}}}"#,
        )
        .unwrap();

        let work = TempDir::new().unwrap();
        let tarballs = TempDir::new().unwrap();
        let mut opts = options(&source, &work);
        opts.tarball_dir = Some(tarballs.path().to_path_buf());
        let install_root = opts.install_root.clone();

        let pipeline = Pipeline::new(NpmClient::with_program("definitely-not-npm-xyz"), opts);
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, CrossnpmError::TarballMissing { .. }));
        assert_eq!(err.stage(), Some("fetch"));
        // Install root was never touched
        assert!(!install_root.exists());
    }

    #[tokio::test]
    async fn invalid_manifest_fails_in_resolve() {
        let source = TempDir::new().unwrap();
        std::fs::write(
            source.path().join("package-lock.json"),
            r#"{"dependencies": {"a": {"version": "~1.0"}}}"#,
        )
        .unwrap();

        let work = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            NpmClient::with_program("definitely-not-npm-xyz"),
            options(&source, &work),
        );
        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, CrossnpmError::VersionUnresolved { .. }));
    }
}
