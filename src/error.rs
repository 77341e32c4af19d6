//! Error types for crossnpm
//!
//! All modules use `CrossnpmResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for crossnpm operations
pub type CrossnpmResult<T> = Result<T, CrossnpmError>;

/// All errors that can occur in crossnpm
#[derive(Error, Debug)]
pub enum CrossnpmError {
    // Manifest errors
    #[error("No npm lock manifest found in {0} and no fallback configured")]
    ManifestMissing(PathBuf),

    #[error("Invalid lock manifest at {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Package {name} has unresolved version '{version}': lock manifests must pin exact versions")]
    VersionUnresolved { name: String, version: String },

    // Cache errors
    #[error("Failed to materialize {name}@{version} into the cache: {reason}")]
    CachePopulation {
        name: String,
        version: String,
        reason: String,
    },

    #[error("Cache verification failed: {0}")]
    CacheVerify(String),

    #[error("Integrity mismatch for {0}")]
    IntegrityMismatch(PathBuf),

    #[error("Unsupported integrity string '{0}'")]
    IntegrityUnsupported(String),

    #[error("Tarball not found for {name}@{version}: expected {path}")]
    TarballMissing {
        name: String,
        version: String,
        path: PathBuf,
    },

    // Install errors
    #[error("npm not found in PATH. Install Node.js or point --npm at the binary")]
    NpmNotFound,

    #[error("npm pack failed: {0}")]
    PackFailed(String),

    #[error("Offline install failed (exit code {code}): {stderr}")]
    InstallFailed { code: i32, stderr: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrossnpmError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Pipeline stage this error is attributed to, if any
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::ManifestMissing(_) | Self::ManifestInvalid { .. } | Self::VersionUnresolved { .. } => {
                Some("resolve")
            }
            Self::CachePopulation { .. }
            | Self::CacheVerify(_)
            | Self::IntegrityMismatch(_)
            | Self::IntegrityUnsupported(_)
            | Self::TarballMissing { .. } => Some("fetch"),
            Self::PackFailed(_) | Self::InstallFailed { .. } => Some("install"),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestMissing(_) => {
                Some("Run 'npm shrinkwrap' in the source tree or configure manifest.fallback")
            }
            Self::NpmNotFound => Some("Install Node.js from https://nodejs.org"),
            Self::CacheVerify(_) => Some("Wipe the cache directory and re-run the fetch stage"),
            _ => None,
        }
    }
}
