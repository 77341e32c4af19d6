//! Offline install into an isolated prefix
//!
//! Packs the source tree into a tarball from local files only, destroys
//! any stale install root, and runs a global npm install constrained to
//! the populated cache. Given identical source, cache contents and flags,
//! repeated installs produce an identical install root (timestamps
//! excluded) - the reproducibility contract of the whole pipeline.

use crate::arch::map_node_arch;
use crate::error::{CrossnpmError, CrossnpmResult};
use crate::manifest::{self, ResolvedManifest};
use crate::npm::NpmClient;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Structured options for one offline install
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Package source tree
    pub source_dir: PathBuf,
    /// Populated dependency cache
    pub cache_dir: PathBuf,
    /// Isolated prefix, destroyed and recreated per install
    pub install_root: PathBuf,
    /// Cross-build target architecture string
    pub target_arch: String,
    /// Bypass the architecture mapping with an explicit Node arch
    pub arch_override: Option<String>,
    /// Include development-only dependencies
    pub install_dev: bool,
    /// Lock manifest to copy in when the source tree has none
    pub fallback_manifest: Option<PathBuf>,
    /// Opaque pass-through flags for `npm install`
    pub extra_args: Vec<String>,
}

impl InstallOptions {
    /// The Node architecture passed to the native-addon toolchain
    pub fn node_arch(&self) -> String {
        match self.arch_override {
            Some(ref arch) => arch.clone(),
            None => map_node_arch(&self.target_arch).to_string(),
        }
    }
}

/// Runs the pack + offline-install sequence
pub struct OfflineInstaller {
    npm: NpmClient,
}

impl OfflineInstaller {
    pub fn new(npm: NpmClient) -> Self {
        Self { npm }
    }

    /// Install the source tree and its cached dependencies into the
    /// install root. Strict sequence, no network: manifest, pack, clean
    /// root, install, manifest cleanup.
    pub async fn install(&self, opts: &InstallOptions) -> CrossnpmResult<PathBuf> {
        self.npm.ensure_available().await?;

        let resolved = manifest::resolve(&opts.source_dir, opts.fallback_manifest.as_deref())?;

        let result = self.install_inner(opts, &resolved).await;

        // The transient manifest is removed whether or not the install
        // succeeded; the source tree must end up pristine either way.
        let cleanup = resolved.cleanup();
        let root = result?;
        cleanup?;

        Ok(root)
    }

    async fn install_inner(
        &self,
        opts: &InstallOptions,
        resolved: &ResolvedManifest,
    ) -> CrossnpmResult<PathBuf> {
        debug!("Installing with manifest {}", resolved.path().display());

        let scratch = tempfile::tempdir()
            .map_err(|e| CrossnpmError::io("creating pack scratch directory", e))?;
        let tarball = self.pack(&opts.source_dir, scratch.path()).await?;

        // Stale artifacts must never leak between builds
        if opts.install_root.exists() {
            debug!("Discarding stale install root {}", opts.install_root.display());
            fs::remove_dir_all(&opts.install_root).await.map_err(|e| {
                CrossnpmError::io(
                    format!("removing install root {}", opts.install_root.display()),
                    e,
                )
            })?;
        }
        fs::create_dir_all(&opts.install_root).await.map_err(|e| {
            CrossnpmError::io(
                format!("creating install root {}", opts.install_root.display()),
                e,
            )
        })?;

        info!(
            "Offline install of {} for arch {}",
            tarball.display(),
            opts.node_arch()
        );

        let args = install_args(opts, &tarball);
        let output = self.npm.exec(&args, None).await?;
        if !output.status.success() {
            return Err(CrossnpmError::InstallFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(opts.install_root.clone())
    }

    /// Package the source tree into a tarball inside `dest`, entirely
    /// from local files. Returns the tarball path.
    async fn pack(&self, source_dir: &Path, dest: &Path) -> CrossnpmResult<PathBuf> {
        let source = source_dir.canonicalize().map_err(|e| {
            CrossnpmError::io(format!("resolving source path {}", source_dir.display()), e)
        })?;

        let args = vec!["pack".to_string(), source.display().to_string()];
        let stdout = self
            .npm
            .exec_checked(&args, Some(dest))
            .await
            .map_err(|e| CrossnpmError::PackFailed(e.to_string()))?;

        let basename = tarball_from_pack_output(&stdout)
            .ok_or_else(|| CrossnpmError::PackFailed("npm pack reported no tarball".to_string()))?;

        Ok(dest.join(basename))
    }
}

/// Flags for the offline install: global into the install root, cache
/// only, mapped architecture for any native-addon rebuild
fn install_args(opts: &InstallOptions, tarball: &Path) -> Vec<String> {
    let node_arch = opts.node_arch();
    let mut args = vec![
        "install".to_string(),
        tarball.display().to_string(),
        "--global".to_string(),
        "--offline".to_string(),
        "--cache".to_string(),
        opts.cache_dir.display().to_string(),
        "--prefix".to_string(),
        opts.install_root.display().to_string(),
        format!("--arch={node_arch}"),
        format!("--target_arch={node_arch}"),
    ];
    if !opts.install_dev {
        args.push("--production".to_string());
    }
    args.extend(opts.extra_args.iter().cloned());
    args
}

/// `npm pack` prints the created tarball filename as its last line
fn tarball_from_pack_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
