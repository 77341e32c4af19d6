//! Final prefix layout: native addons versus plain files
//!
//! The offline install leaves node-gyp scratch output inside each native
//! addon's `build/` directory. Only the release `.node` binaries are
//! shipped from those; Debug output, object files and per-dependency lock
//! manifests are build-time artifacts and never reach the final prefix.
//! A `build/` directory without release output is ordinary package
//! content (a common publish layout, and `build` is itself a package
//! name) and ships verbatim.

use crate::error::{CrossnpmError, CrossnpmResult};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Library subtree of a prefix
pub const LIB_DIR: &str = "lib";
/// Executable subtree of a prefix
pub const BIN_DIR: &str = "bin";
/// npm's conventional modules directory
pub const MODULES_DIR: &str = "node_modules";
/// Library include directory name expected by downstream tooling
pub const NODE_ALIAS: &str = "node";

/// node-gyp output directory inside an addon package
const BUILD_DIR: &str = "build";
/// Final compiled output inside the build directory
const RELEASE_DIR: &str = "Release";

/// Extensions of intermediate compiler output, never shipped
const INTERMEDIATE_EXTS: &[&str] = &["o", "a", "d"];

/// Lock manifests stripped from every nested dependency directory
const LOCK_FILES: &[&str] = &["package-lock.json", "npm-shrinkwrap.json"];

/// What the partition pass produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartitionSummary {
    /// Release `.node` addons copied into the final prefix
    pub native_modules: usize,
    /// Nested lock manifests removed from the final prefix
    pub stripped_manifests: usize,
    /// Whether an executable tree existed and was copied
    pub binaries_copied: bool,
}

/// Partition an install root into the final prefix.
///
/// Copies the library tree verbatim minus node-gyp build directories and
/// intermediates, re-copies release native addons preserving their
/// relative paths, copies the executable tree when one exists, strips
/// nested lock manifests and creates the `lib/node` compatibility alias.
pub fn partition(install_root: &Path, final_prefix: &Path) -> CrossnpmResult<PartitionSummary> {
    let mut summary = PartitionSummary::default();

    let lib_src = install_root.join(LIB_DIR);
    let lib_dest = final_prefix.join(LIB_DIR);
    fs::create_dir_all(&lib_dest)
        .map_err(|e| CrossnpmError::io(format!("creating {}", lib_dest.display()), e))?;

    if lib_src.is_dir() {
        let gyp = discover_gyp_output(&lib_src)?;
        copy_plain_tree(&lib_src, &lib_dest, &gyp.build_dirs)?;
        summary.native_modules = copy_release_addons(&lib_src, &lib_dest, &gyp.addons)?;
    }

    let bin_src = install_root.join(BIN_DIR);
    if bin_src.is_dir() {
        copy_tree(&bin_src, &final_prefix.join(BIN_DIR))?;
        summary.binaries_copied = true;
    } else {
        // Absence of executables is a normal, empty case
        debug!("No executable tree in {}", install_root.display());
    }

    summary.stripped_manifests = strip_lock_manifests(&lib_dest.join(MODULES_DIR))?;

    create_modules_alias(&lib_dest)?;

    info!(
        "Partitioned {} -> {}: {} native addons, {} lock manifests stripped",
        install_root.display(),
        final_prefix.display(),
        summary.native_modules,
        summary.stripped_manifests
    );
    Ok(summary)
}

/// node-gyp output discovered under the library tree
#[derive(Debug, Default)]
struct GypOutput {
    /// Relative paths of `build/` directories holding release addons
    build_dirs: HashSet<PathBuf>,
    /// Relative paths of the `build/Release/*.node` files themselves
    addons: Vec<PathBuf>,
}

/// Find every `build/Release/*.node` file under `src`.
///
/// Only a `build/` directory that produced such a file is node-gyp
/// scratch; any other `build/` directory is plain package content.
fn discover_gyp_output(src: &Path) -> CrossnpmResult<GypOutput> {
    let mut out = GypOutput::default();

    for entry in WalkDir::new(src) {
        let entry =
            entry.map_err(|e| CrossnpmError::io(format!("walking {}", src.display()), e.into()))?;
        let path = entry.path();

        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some("node")
        {
            continue;
        }
        let Some(release) = path.parent() else {
            continue;
        };
        let Some(build) = release.parent() else {
            continue;
        };
        if !release.file_name().is_some_and(|n| n == RELEASE_DIR)
            || !build.file_name().is_some_and(|n| n == BUILD_DIR)
        {
            continue;
        }

        let rel_build = build
            .strip_prefix(src)
            .map_err(|e| CrossnpmError::Internal(e.to_string()))?;
        out.build_dirs.insert(rel_build.to_path_buf());

        let rel = path
            .strip_prefix(src)
            .map_err(|e| CrossnpmError::Internal(e.to_string()))?;
        out.addons.push(rel.to_path_buf());
    }

    Ok(out)
}

/// True for intermediate compiler output files
fn is_intermediate(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| INTERMEDIATE_EXTS.contains(&e))
}

/// Copy the library tree verbatim, excluding node-gyp build directories
/// and intermediate object files
fn copy_plain_tree(src: &Path, dest: &Path, gyp_dirs: &HashSet<PathBuf>) -> CrossnpmResult<()> {
    for entry in WalkDir::new(src) {
        let entry =
            entry.map_err(|e| CrossnpmError::io(format!("walking {}", src.display()), e.into()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| CrossnpmError::Internal(e.to_string()))?;
        if rel.as_os_str().is_empty() || gyp_dirs.iter().any(|d| rel.starts_with(d)) {
            continue;
        }

        let target = dest.join(rel);
        copy_entry(entry.path(), &target, entry.path_is_symlink())?;
    }
    Ok(())
}

/// Re-copy the release addons, preserving relative paths.
///
/// Everything else under a node-gyp build directory is pre-final scratch
/// and is left behind.
fn copy_release_addons(src: &Path, dest: &Path, addons: &[PathBuf]) -> CrossnpmResult<usize> {
    for rel in addons {
        let path = src.join(rel);
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CrossnpmError::io(format!("creating {}", parent.display()), e))?;
        }
        fs::copy(&path, &target).map_err(|e| {
            CrossnpmError::io(
                format!("copying addon {} to {}", path.display(), target.display()),
                e,
            )
        })?;
        debug!("Shipped native addon {}", rel.display());
    }

    Ok(addons.len())
}

/// Copy a whole tree, preserving symbolic links
fn copy_tree(src: &Path, dest: &Path) -> CrossnpmResult<()> {
    for entry in WalkDir::new(src) {
        let entry =
            entry.map_err(|e| CrossnpmError::io(format!("walking {}", src.display()), e.into()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| CrossnpmError::Internal(e.to_string()))?;
        let target = if rel.as_os_str().is_empty() {
            dest.to_path_buf()
        } else {
            dest.join(rel)
        };
        copy_entry(entry.path(), &target, entry.path_is_symlink())?;
    }
    Ok(())
}

/// Copy one filesystem entry (directory, symlink or regular file)
fn copy_entry(path: &Path, target: &Path, is_symlink: bool) -> CrossnpmResult<()> {
    if is_symlink {
        let link = fs::read_link(path)
            .map_err(|e| CrossnpmError::io(format!("reading link {}", path.display()), e))?;
        if target.symlink_metadata().is_ok() {
            fs::remove_file(target)
                .map_err(|e| CrossnpmError::io(format!("removing {}", target.display()), e))?;
        }
        #[cfg(unix)]
        std::os::unix::fs::symlink(&link, target)
            .map_err(|e| CrossnpmError::io(format!("linking {}", target.display()), e))?;
        #[cfg(not(unix))]
        let _ = link;
        return Ok(());
    }

    if path.is_dir() {
        fs::create_dir_all(target)
            .map_err(|e| CrossnpmError::io(format!("creating {}", target.display()), e))?;
    } else if is_intermediate(path) {
        debug!("Discarding intermediate {}", path.display());
    } else {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CrossnpmError::io(format!("creating {}", parent.display()), e))?;
        }
        fs::copy(path, target).map_err(|e| {
            CrossnpmError::io(
                format!("copying {} to {}", path.display(), target.display()),
                e,
            )
        })?;
    }
    Ok(())
}

/// Remove lock manifests from every nested dependency directory,
/// top-level and scoped alike
fn strip_lock_manifests(modules_root: &Path) -> CrossnpmResult<usize> {
    if !modules_root.is_dir() {
        return Ok(0);
    }

    let mut stripped = 0;
    for entry in WalkDir::new(modules_root) {
        let entry = entry.map_err(|e| {
            CrossnpmError::io(format!("walking {}", modules_root.display()), e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if LOCK_FILES.contains(&name.as_ref()) {
            fs::remove_file(entry.path())
                .map_err(|e| CrossnpmError::io(format!("removing {}", entry.path().display()), e))?;
            stripped += 1;
        }
    }
    Ok(stripped)
}

/// Create the `lib/node` -> `node_modules` alias expected by downstream
/// tooling
fn create_modules_alias(lib_dest: &Path) -> CrossnpmResult<()> {
    let alias = lib_dest.join(NODE_ALIAS);
    if alias.symlink_metadata().is_ok() {
        fs::remove_file(&alias)
            .map_err(|e| CrossnpmError::io(format!("removing alias {}", alias.display()), e))?;
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(MODULES_DIR, &alias)
        .map_err(|e| CrossnpmError::io(format!("creating alias {}", alias.display()), e))?;
    Ok(())
}
