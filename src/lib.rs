//! Crossnpm - Offline npm staging for cross builds
//!
//! Resolves a pinned lock manifest, materializes every transitive
//! dependency into a local npm cache, performs an offline install into an
//! isolated prefix, and partitions the result into target-architecture
//! native addons versus plain files.

pub mod arch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod integrity;
pub mod manifest;
pub mod npm;
pub mod partition;
pub mod pipeline;

pub use error::{CrossnpmError, CrossnpmResult};
