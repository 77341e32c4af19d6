//! Thin wrapper around the `npm` binary
//!
//! Every npm invocation goes through here so flags like `--cache` and
//! `--registry` are always passed explicitly on the command line; nothing
//! in this crate mutates the process environment to configure npm.

use crate::error::{CrossnpmError, CrossnpmResult};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Handle on the npm binary used for all external invocations
#[derive(Debug, Clone)]
pub struct NpmClient {
    program: String,
}

impl NpmClient {
    /// Create a client using `npm` from PATH
    pub fn new() -> Self {
        Self {
            program: "npm".to_string(),
        }
    }

    /// Create a client using a specific npm binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check if the npm binary is runnable
    pub async fn available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Fail early if npm is not runnable
    pub async fn ensure_available(&self) -> CrossnpmResult<()> {
        if self.available().await {
            Ok(())
        } else {
            Err(CrossnpmError::NpmNotFound)
        }
    }

    /// Execute an npm command and return the raw output
    pub async fn exec(
        &self,
        args: &[String],
        workdir: Option<&Path>,
    ) -> CrossnpmResult<std::process::Output> {
        debug!("Executing: {} {:?}", self.program, args);

        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = workdir {
            cmd.current_dir(dir);
        }

        cmd.output()
            .await
            .map_err(|e| CrossnpmError::command_failed(format!("{} {:?}", self.program, args), e))
    }

    /// Execute an npm command, failing on non-zero exit, returning stdout
    pub async fn exec_checked(
        &self,
        args: &[String],
        workdir: Option<&Path>,
    ) -> CrossnpmResult<String> {
        let output = self.exec(args, workdir).await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            Err(CrossnpmError::command_exec(
                format!("{} {:?}", self.program, args),
                stderr,
            ))
        }
    }
}

impl Default for NpmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let npm = NpmClient::with_program("definitely-not-npm-xyz");
        assert!(!npm.available().await);
        assert!(matches!(
            npm.ensure_available().await,
            Err(CrossnpmError::NpmNotFound)
        ));
    }

    #[tokio::test]
    async fn exec_missing_binary_is_command_failed() {
        let npm = NpmClient::with_program("definitely-not-npm-xyz");
        let err = npm
            .exec(&["--version".to_string()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CrossnpmError::CommandFailed { .. }));
    }
}
