//! Offline dependency cache population
//!
//! Walks the lock manifest's dependency tree and materializes every
//! distinct (name, version) pair into a local npm cache while network
//! access is still allowed. The install stage later consumes the cache
//! with no network at all, so a half-populated cache is never acceptable:
//! the first materialization failure aborts the whole populate.

use crate::error::{CrossnpmError, CrossnpmResult};
use crate::integrity::Integrity;
use crate::manifest::{DependencyNode, PackageRef, Shrinkwrap};
use crate::npm::NpmClient;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Where package contents are materialized from.
///
/// Seam between the traversal logic and the concrete npm/registry client;
/// tests drive the populator with an in-memory implementation.
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Ensure one package is present in the cache directory
    async fn materialize(
        &self,
        pkg: &PackageRef,
        integrity: Option<&str>,
        cache_dir: &Path,
    ) -> CrossnpmResult<()>;

    /// Check cache integrity after all packages are materialized
    async fn verify(&self, cache_dir: &Path) -> CrossnpmResult<()>;
}

/// Materializes packages from an npm registry via `npm cache add`
pub struct NpmRegistrySource {
    npm: NpmClient,
    registry: Option<String>,
}

impl NpmRegistrySource {
    pub fn new(npm: NpmClient, registry: Option<String>) -> Self {
        Self { npm, registry }
    }
}

#[async_trait]
impl PackageSource for NpmRegistrySource {
    async fn materialize(
        &self,
        pkg: &PackageRef,
        _integrity: Option<&str>,
        cache_dir: &Path,
    ) -> CrossnpmResult<()> {
        let mut args = vec![
            "cache".to_string(),
            "add".to_string(),
            pkg.to_string(),
            "--cache".to_string(),
            cache_dir.display().to_string(),
        ];
        if let Some(ref registry) = self.registry {
            args.push("--registry".to_string());
            args.push(registry.clone());
        }

        self.npm.exec_checked(&args, None).await.map_err(|e| {
            CrossnpmError::CachePopulation {
                name: pkg.name.clone(),
                version: pkg.version.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }

    async fn verify(&self, cache_dir: &Path) -> CrossnpmResult<()> {
        let args = vec![
            "cache".to_string(),
            "verify".to_string(),
            "--cache".to_string(),
            cache_dir.display().to_string(),
        ];
        self.npm
            .exec_checked(&args, None)
            .await
            .map_err(|e| CrossnpmError::CacheVerify(e.to_string()))?;
        Ok(())
    }
}

/// Materializes packages from a directory of pre-fetched tarballs.
///
/// Tarball basenames follow the `npm pack` convention; when the manifest
/// records an integrity string the tarball is verified against it before
/// it is added to the cache.
pub struct TarballDirSource {
    npm: NpmClient,
    tarball_dir: PathBuf,
}

impl TarballDirSource {
    pub fn new(npm: NpmClient, tarball_dir: PathBuf) -> Self {
        Self { npm, tarball_dir }
    }
}

#[async_trait]
impl PackageSource for TarballDirSource {
    async fn materialize(
        &self,
        pkg: &PackageRef,
        integrity: Option<&str>,
        cache_dir: &Path,
    ) -> CrossnpmResult<()> {
        let tarball = self.tarball_dir.join(pkg.tarball_basename());
        if !tarball.is_file() {
            return Err(CrossnpmError::TarballMissing {
                name: pkg.name.clone(),
                version: pkg.version.clone(),
                path: tarball,
            });
        }

        if let Some(sri) = integrity {
            Integrity::parse(sri)?.verify_file(&tarball)?;
        }

        let args = vec![
            "cache".to_string(),
            "add".to_string(),
            tarball.display().to_string(),
            "--cache".to_string(),
            cache_dir.display().to_string(),
        ];
        self.npm.exec_checked(&args, None).await.map_err(|e| {
            CrossnpmError::CachePopulation {
                name: pkg.name.clone(),
                version: pkg.version.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }

    async fn verify(&self, cache_dir: &Path) -> CrossnpmResult<()> {
        let args = vec![
            "cache".to_string(),
            "verify".to_string(),
            "--cache".to_string(),
            cache_dir.display().to_string(),
        ];
        self.npm
            .exec_checked(&args, None)
            .await
            .map_err(|e| CrossnpmError::CacheVerify(e.to_string()))?;
        Ok(())
    }
}

/// What a populate pass materialized
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PopulateSummary {
    /// Distinct (name, version) pairs materialized
    pub packages: usize,
    /// Subset only reachable through development-only edges
    pub dev_packages: usize,
}

/// Materialize every distinct (name, version) pair reachable in the
/// manifest tree, then verify the cache.
///
/// Uses an explicit worklist with a visited set rather than recursion:
/// work is bounded by the number of distinct resolved versions, not tree
/// edges, and a manifest that somehow encodes a cycle cannot loop.
/// Dev-only packages are cached like any other; they are filtered at
/// install time, not here.
pub async fn populate(
    manifest: &Shrinkwrap,
    source: &dyn PackageSource,
    cache_dir: &Path,
) -> CrossnpmResult<PopulateSummary> {
    fs::create_dir_all(cache_dir).await.map_err(|e| {
        CrossnpmError::io(format!("creating cache directory {}", cache_dir.display()), e)
    })?;

    let mut visited: HashSet<PackageRef> = HashSet::new();
    let mut dev_packages = 0;
    let mut worklist: Vec<(&String, &DependencyNode)> = manifest.dependencies.iter().collect();

    while let Some((name, node)) = worklist.pop() {
        let pkg = PackageRef::new(name.clone(), node.version.clone());
        if visited.contains(&pkg) {
            debug!("Already materialized {}, skipping", pkg);
        } else {
            debug!("Materializing {}", pkg);
            source
                .materialize(&pkg, node.integrity.as_deref(), cache_dir)
                .await?;
            if node.dev {
                dev_packages += 1;
            }
            visited.insert(pkg);
        }
        worklist.extend(node.dependencies.iter());
    }

    source.verify(cache_dir).await?;

    let summary = PopulateSummary {
        packages: visited.len(),
        dev_packages,
    };
    info!(
        "Cache populated: {} distinct packages ({} dev-only) in {}",
        summary.packages,
        summary.dev_packages,
        cache_dir.display()
    );
    Ok(summary)
}

/// Wipe the cache directory, for the clear-then-repopulate policy
pub async fn clear(cache_dir: &Path) -> CrossnpmResult<()> {
    if cache_dir.exists() {
        info!("Clearing cache directory {}", cache_dir.display());
        fs::remove_dir_all(cache_dir).await.map_err(|e| {
            CrossnpmError::io(format!("clearing cache {}", cache_dir.display()), e)
        })?;
    }
    fs::create_dir_all(cache_dir).await.map_err(|e| {
        CrossnpmError::io(format!("creating cache directory {}", cache_dir.display()), e)
    })?;
    Ok(())
}
