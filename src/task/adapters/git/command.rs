//! Serialized, time-bounded git subprocess runner.

use crate::task::ports::{BranchServiceError, BranchServiceResult};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::debug;

/// Captured result of one git invocation.
#[derive(Debug, Clone)]
pub(super) struct GitOutput {
    pub(super) success: bool,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

impl GitOutput {
    /// Returns the most useful diagnostic text: stderr, or stdout when git
    /// reported the problem there (as `merge` does for conflicts).
    pub(super) fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_owned()
        } else {
            stderr.to_owned()
        }
    }
}

/// Runs git commands inside one working copy.
#[derive(Debug)]
pub(super) struct GitRunner {
    workdir: PathBuf,
    binary: String,
    command_timeout: Duration,
    permit: Semaphore,
}

impl GitRunner {
    pub(super) fn new(workdir: PathBuf, binary: String, command_timeout: Duration) -> Self {
        Self {
            workdir,
            binary,
            command_timeout,
            permit: Semaphore::new(1),
        }
    }

    /// Runs git and returns its output regardless of exit status.
    pub(super) async fn run(&self, args: &[&str]) -> BranchServiceResult<GitOutput> {
        let command_line = args.join(" ");
        let _permit = self
            .permit
            .acquire()
            .await
            .map_err(BranchServiceError::runtime)?;

        debug!(
            command = %command_line,
            workdir = %self.workdir.display(),
            "running git"
        );

        let child = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(BranchServiceError::runtime)?;

        let output = timeout(self.command_timeout, child.wait_with_output())
            .await
            .map_err(|_| BranchServiceError::Timeout {
                command: command_line.clone(),
                seconds: self.command_timeout.as_secs(),
            })?
            .map_err(BranchServiceError::runtime)?;

        let result = GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            command = %command_line,
            success = result.success,
            "git finished"
        );
        Ok(result)
    }

    /// Runs git and fails with [`BranchServiceError::CommandFailed`] on a
    /// non-zero exit. Returns trimmed stdout.
    pub(super) async fn run_checked(&self, args: &[&str]) -> BranchServiceResult<String> {
        let output = self.run(args).await?;
        if !output.success {
            return Err(BranchServiceError::CommandFailed {
                command: args.join(" "),
                stderr: output.diagnostic(),
            });
        }
        Ok(output.stdout.trim().to_owned())
    }
}
