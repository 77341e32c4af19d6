//! Lock manifest resolution and model
//!
//! A build is only reproducible when every transitive dependency is pinned
//! to an exact version. The resolver locates the authoritative lock file
//! for a source tree (shrinkwrap first, then package-lock, then a
//! configured fallback copied in); the model parses it into a dependency
//! tree the cache populator can walk.

use crate::error::{CrossnpmError, CrossnpmResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Newer lock format, produced by `npm shrinkwrap`
pub const SHRINKWRAP_FILE: &str = "npm-shrinkwrap.json";

/// Older lock format, produced implicitly by `npm install`
pub const PACKAGE_LOCK_FILE: &str = "package-lock.json";

/// One resolved package and its own resolved subtree
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyNode {
    /// Exact resolved version (never a range)
    pub version: String,

    /// Package is only reachable through development-only edges
    #[serde(default)]
    pub dev: bool,

    /// Subresource integrity string for the tarball, when recorded
    #[serde(default)]
    pub integrity: Option<String>,

    /// Resolved subtree; may re-list names appearing elsewhere
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencyNode>,
}

/// The resolved dependency lock data, read-only for one build
#[derive(Debug, Clone, Deserialize)]
pub struct Shrinkwrap {
    /// Root package name
    pub name: Option<String>,

    /// Root package version
    pub version: Option<String>,

    /// Direct dependencies
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencyNode>,
}

impl Shrinkwrap {
    /// Load and validate a lock manifest from disk.
    ///
    /// Every version in the tree must parse as an exact semver version;
    /// a range or git/url reference fails the whole load.
    pub fn load(path: &Path) -> CrossnpmResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CrossnpmError::io(format!("reading manifest {}", path.display()), e))?;

        let manifest: Shrinkwrap =
            serde_json::from_str(&content).map_err(|e| CrossnpmError::ManifestInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        manifest.validate_pinned()?;
        Ok(manifest)
    }

    /// Check that every node in the tree carries an exact version
    fn validate_pinned(&self) -> CrossnpmResult<()> {
        let mut worklist: Vec<(&String, &DependencyNode)> = self.dependencies.iter().collect();

        while let Some((name, node)) = worklist.pop() {
            if semver::Version::parse(&node.version).is_err() {
                return Err(CrossnpmError::VersionUnresolved {
                    name: name.clone(),
                    version: node.version.clone(),
                });
            }
            worklist.extend(node.dependencies.iter());
        }

        Ok(())
    }
}

/// Identity of a resolved package: (name, version)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
}

impl PackageRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Tarball basename following the `npm pack` naming convention.
    ///
    /// Scoped names drop the `@` and replace `/` with `-`:
    /// `@types/node@1.2.3` packs as `types-node-1.2.3.tgz`.
    pub fn tarball_basename(&self) -> String {
        let base = match self.name.strip_prefix('@') {
            Some(scoped) => scoped.replace('/', "-"),
            None => self.name.clone(),
        };
        format!("{}-{}.tgz", base, self.version)
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A located lock manifest, with cleanup tracking for materialized copies
#[derive(Debug)]
pub struct ResolvedManifest {
    path: PathBuf,
    materialized: bool,
}

impl ResolvedManifest {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the manifest was copied into the source tree by resolve()
    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    /// Remove a materialized manifest copy, restoring the source tree.
    ///
    /// A manifest that was already present in the source is left alone.
    pub fn cleanup(self) -> CrossnpmResult<()> {
        if self.materialized {
            debug!("Removing materialized manifest {}", self.path.display());
            fs::remove_file(&self.path).map_err(|e| {
                CrossnpmError::io(format!("removing manifest {}", self.path.display()), e)
            })?;
        }
        Ok(())
    }
}

/// Locate the authoritative lock manifest for a source tree.
///
/// Priority: `npm-shrinkwrap.json` in the source, then
/// `package-lock.json`, then a copy of the configured fallback manifest.
/// Failing all three is fatal: without a fully pinned manifest no build
/// can be declared reproducible.
pub fn resolve(source_dir: &Path, fallback: Option<&Path>) -> CrossnpmResult<ResolvedManifest> {
    for candidate in [SHRINKWRAP_FILE, PACKAGE_LOCK_FILE] {
        let path = source_dir.join(candidate);
        if path.is_file() {
            debug!("Using lock manifest from source: {}", path.display());
            return Ok(ResolvedManifest {
                path,
                materialized: false,
            });
        }
    }

    if let Some(fallback) = fallback {
        if !fallback.is_file() {
            return Err(CrossnpmError::PathNotFound(fallback.to_path_buf()));
        }
        let dest = source_dir.join(SHRINKWRAP_FILE);
        fs::copy(fallback, &dest).map_err(|e| {
            CrossnpmError::io(
                format!(
                    "copying fallback manifest {} to {}",
                    fallback.display(),
                    dest.display()
                ),
                e,
            )
        })?;
        info!("Materialized fallback manifest at {}", dest.display());
        return Ok(ResolvedManifest {
            path: dest,
            materialized: true,
        });
    }

    Err(CrossnpmError::ManifestMissing(source_dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_lock(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn resolve_prefers_shrinkwrap() {
        let dir = TempDir::new().unwrap();
        let shrinkwrap = write_lock(dir.path(), SHRINKWRAP_FILE, "{}");
        write_lock(dir.path(), PACKAGE_LOCK_FILE, "{}");

        let resolved = resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.path(), shrinkwrap);
        assert!(!resolved.is_materialized());
    }

    #[test]
    fn resolve_falls_back_to_package_lock() {
        let dir = TempDir::new().unwrap();
        let lock = write_lock(dir.path(), PACKAGE_LOCK_FILE, "{}");

        let resolved = resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.path(), lock);
        assert!(!resolved.is_materialized());
    }

    #[test]
    fn resolve_materializes_fallback_and_cleans_up() {
        let source = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let fallback = write_lock(elsewhere.path(), "saved.json", "{}");

        let resolved = resolve(source.path(), Some(&fallback)).unwrap();
        let copied = source.path().join(SHRINKWRAP_FILE);
        assert_eq!(resolved.path(), copied);
        assert!(resolved.is_materialized());
        assert!(copied.is_file());

        resolved.cleanup().unwrap();
        assert!(!copied.exists());
    }

    #[test]
    fn resolve_fails_without_manifest_or_fallback() {
        let dir = TempDir::new().unwrap();
        let err = resolve(dir.path(), None).unwrap_err();
        assert!(matches!(err, CrossnpmError::ManifestMissing(_)));
    }

    #[test]
    fn resolve_fails_on_missing_fallback_file() {
        let dir = TempDir::new().unwrap();
        let err = resolve(dir.path(), Some(Path::new("/nonexistent/lock.json"))).unwrap_err();
        assert!(matches!(err, CrossnpmError::PathNotFound(_)));
    }

    #[test]
    fn cleanup_leaves_source_manifest_alone() {
        let dir = TempDir::new().unwrap();
        let shrinkwrap = write_lock(dir.path(), SHRINKWRAP_FILE, "{}");

        let resolved = resolve(dir.path(), None).unwrap();
        resolved.cleanup().unwrap();
        assert!(shrinkwrap.is_file());
    }

    #[test]
    fn load_parses_nested_tree() {
        let dir = TempDir::new().unwrap();
        let path = write_lock(
            dir.path(),
            SHRINKWRAP_FILE,
            r#"{
                "name": "app",
                "version": "1.0.0",
                "dependencies": {
                    "a": {
                        "version": "1.0.0",
                        "dependencies": {
                            "b": {"version": "2.0.0", "dev": true}
                        }
                    }
                }
            }"#,
        );

        let manifest = Shrinkwrap::load(&path).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("app"));
        let a = &manifest.dependencies["a"];
        assert_eq!(a.version, "1.0.0");
        let b = &a.dependencies["b"];
        assert_eq!(b.version, "2.0.0");
        assert!(b.dev);
    }

    #[test]
    fn load_rejects_version_ranges() {
        let dir = TempDir::new().unwrap();
        let path = write_lock(
            dir.path(),
            SHRINKWRAP_FILE,
            r#"{"dependencies": {"a": {"version": "^1.0.0"}}}"#,
        );

        let err = Shrinkwrap::load(&path).unwrap_err();
        match err {
            CrossnpmError::VersionUnresolved { name, version } => {
                assert_eq!(name, "a");
                assert_eq!(version, "^1.0.0");
            }
            other => panic!("expected VersionUnresolved, got {other}"),
        }
    }

    #[test]
    fn load_rejects_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = write_lock(dir.path(), SHRINKWRAP_FILE, "not json");
        let err = Shrinkwrap::load(&path).unwrap_err();
        assert!(matches!(err, CrossnpmError::ManifestInvalid { .. }));
    }

    #[test]
    fn package_ref_display() {
        let pkg = PackageRef::new("lodash", "4.17.21");
        assert_eq!(pkg.to_string(), "lodash@4.17.21");
    }

    #[test]
    fn tarball_basename_plain_and_scoped() {
        assert_eq!(
            PackageRef::new("lodash", "4.17.21").tarball_basename(),
            "lodash-4.17.21.tgz"
        );
        assert_eq!(
            PackageRef::new("@types/node", "20.1.0").tarball_basename(),
            "types-node-20.1.0.tgz"
        );
    }
}
