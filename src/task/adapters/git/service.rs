//! [`BranchService`] implementation over the `git` executable.

use super::command::GitRunner;
use crate::config::{ConfigError, RepositoryConfig};
use crate::task::{
    domain::{BranchName, CommitRef, TaskId},
    ports::{
        BranchOperation, BranchService, BranchServiceError, BranchServiceResult,
        WorkingCopyStatus,
    },
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Default per-command limit when none is configured.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Branch service backed by a local Git working copy.
///
/// The working copy's checked-out branch is shared mutable state. This
/// adapter serializes individual git subprocesses but not sequences of
/// calls; wrap multi-step work in a caller-side lock.
#[derive(Debug)]
pub struct GitBranchService {
    runner: GitRunner,
    default_branch: BranchName,
}

impl GitBranchService {
    /// Creates a service for the working copy at `workdir`, using `git` from
    /// `PATH` and a 30 second command timeout.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>, default_branch: BranchName) -> Self {
        Self {
            runner: GitRunner::new(
                workdir.into(),
                String::from("git"),
                DEFAULT_COMMAND_TIMEOUT,
            ),
            default_branch,
        }
    }

    /// Creates a service from repository configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the configured default branch
    /// is not a valid branch name.
    pub fn from_config(config: &RepositoryConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            runner: GitRunner::new(
                config.path.clone(),
                config.git_binary.clone(),
                config.command_timeout(),
            ),
            default_branch: config.default_branch_name()?,
        })
    }

    async fn checkout_default(&self) -> BranchServiceResult<()> {
        self.runner
            .run_checked(&["checkout", "--quiet", self.default_branch.as_str()])
            .await
            .map(drop)
    }

    async fn local_branch_exists(&self, branch: &BranchName) -> BranchServiceResult<bool> {
        let reference = format!("refs/heads/{branch}");
        let output = self
            .runner
            .run(&["show-ref", "--verify", "--quiet", reference.as_str()])
            .await?;
        Ok(output.success)
    }

    async fn changed_paths(&self) -> BranchServiceResult<Vec<String>> {
        const ARGS: [&str; 3] = ["status", "--porcelain=v1", "--untracked-files=all"];
        // Status codes are column-aligned; the output must not be trimmed.
        let output = self.runner.run(&ARGS).await?;
        if !output.success {
            return Err(BranchServiceError::CommandFailed {
                command: ARGS.join(" "),
                stderr: output.diagnostic(),
            });
        }
        Ok(parse_porcelain(&output.stdout))
    }

    async fn merge_into_default(&self, branch: &BranchName) -> BranchServiceResult<()> {
        let merge = self
            .runner
            .run(&["merge", "--no-edit", branch.as_str()])
            .await?;
        if merge.success {
            return Ok(());
        }

        let cause = merge.diagnostic();
        match self.runner.run(&["merge", "--abort"]).await {
            Ok(abort) if !abort.success => {
                warn!(branch = %branch, cause = %abort.diagnostic(), "merge abort reported failure");
            }
            Err(err) => {
                warn!(branch = %branch, error = %err, "merge abort could not run");
            }
            Ok(_) => {}
        }
        Err(BranchServiceError::MergeFailed {
            branch: branch.clone(),
            cause,
        })
    }
}

/// Extracts paths from `git status --porcelain=v1` output.
///
/// Renames report the destination path.
fn parse_porcelain(porcelain: &str) -> Vec<String> {
    porcelain
        .lines()
        .filter_map(|line| line.get(3..))
        .map(|path| {
            path.rsplit_once(" -> ")
                .map_or(path, |(_, destination)| destination)
                .to_owned()
        })
        .filter(|path| !path.is_empty())
        .collect()
}

#[async_trait]
impl BranchService for GitBranchService {
    fn default_branch(&self) -> &BranchName {
        &self.default_branch
    }

    async fn create_branch(&self, task_id: TaskId) -> BranchServiceResult<BranchName> {
        let branch = BranchName::for_task(task_id);

        let changed = self.changed_paths().await?;
        if !changed.is_empty() {
            return Err(BranchServiceError::DirtyWorkingCopy {
                changed: changed.len(),
            });
        }
        if self.local_branch_exists(&branch).await? {
            return Err(BranchServiceError::BranchExists(branch));
        }

        self.runner
            .run_checked(&[
                "checkout",
                "--quiet",
                "-b",
                branch.as_str(),
                self.default_branch.as_str(),
            ])
            .await?;
        info!(task_id = %task_id, branch = %branch, "created task branch");
        Ok(branch)
    }

    async fn current_branch(&self) -> BranchServiceResult<BranchName> {
        let output = self.runner.run(&["symbolic-ref", "--short", "HEAD"]).await?;
        if !output.success {
            return Err(BranchServiceError::InvalidOutput(String::from(
                "HEAD is detached",
            )));
        }
        BranchName::new(output.stdout.trim())
            .map_err(|err| BranchServiceError::InvalidOutput(err.to_string()))
    }

    async fn cleanup_branch(&self, branch: &BranchName) -> BranchServiceResult<()> {
        if *branch == self.default_branch {
            return Err(BranchServiceError::Rejected {
                operation: BranchOperation::CleanupBranch,
                cause: String::from("refusing to delete the default branch"),
            });
        }

        self.checkout_default().await?;
        if !self.local_branch_exists(branch).await? {
            return Err(BranchServiceError::BranchNotFound(branch.clone()));
        }
        self.runner
            .run_checked(&["branch", "-D", branch.as_str()])
            .await?;
        info!(branch = %branch, "deleted branch");
        Ok(())
    }

    async fn complete_task(&self, task_id: TaskId) -> BranchServiceResult<()> {
        let branch = BranchName::for_task(task_id);

        self.checkout_default().await?;
        if !self.local_branch_exists(&branch).await? {
            return Err(BranchServiceError::BranchNotFound(branch));
        }

        self.merge_into_default(&branch).await?;
        // The merge is already on the default branch, so a leftover task
        // branch is not a completion failure.
        if let Err(err) = self
            .runner
            .run_checked(&["branch", "-d", branch.as_str()])
            .await
        {
            warn!(branch = %branch, error = %err, "merged task branch could not be deleted");
        }
        info!(
            task_id = %task_id,
            branch = %branch,
            target = %self.default_branch,
            "merged task branch"
        );
        Ok(())
    }

    async fn branch_exists(&self, branch: &BranchName) -> BranchServiceResult<bool> {
        self.local_branch_exists(branch).await
    }

    async fn status(&self) -> BranchServiceResult<WorkingCopyStatus> {
        let changed_paths = self.changed_paths().await?;
        let branch = self.current_branch().await?;
        Ok(WorkingCopyStatus {
            branch,
            changed_paths,
        })
    }

    async fn head_commit(&self) -> BranchServiceResult<Option<CommitRef>> {
        let output = self
            .runner
            .run(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await?;
        if !output.success {
            return Ok(None);
        }
        CommitRef::new(output.stdout.trim())
            .map(Some)
            .map_err(|err| BranchServiceError::InvalidOutput(err.to_string()))
    }
}
