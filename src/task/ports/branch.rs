//! Version-control branch port for task-branch binding.
//!
//! A working copy has exactly one checked-out branch at a time and every
//! write-side operation both reads and moves it. Implementations expose no
//! locking of their own; callers serialize multi-step sequences.

use crate::task::domain::{BranchName, CommitRef, TaskId};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for branch service operations.
pub type BranchServiceResult<T> = Result<T, BranchServiceError>;

/// Operations exposed by [`BranchService`], used for diagnostics and fault
/// injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchOperation {
    /// [`BranchService::create_branch`].
    CreateBranch,
    /// [`BranchService::current_branch`].
    CurrentBranch,
    /// [`BranchService::cleanup_branch`].
    CleanupBranch,
    /// [`BranchService::complete_task`].
    CompleteTask,
    /// [`BranchService::branch_exists`].
    BranchExists,
    /// [`BranchService::status`].
    Status,
    /// [`BranchService::head_commit`].
    HeadCommit,
}

impl BranchOperation {
    /// Returns a stable name for logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateBranch => "create_branch",
            Self::CurrentBranch => "current_branch",
            Self::CleanupBranch => "cleanup_branch",
            Self::CompleteTask => "complete_task",
            Self::BranchExists => "branch_exists",
            Self::Status => "status",
            Self::HeadCommit => "head_commit",
        }
    }
}

impl fmt::Display for BranchOperation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Snapshot of the working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopyStatus {
    /// Currently checked-out branch.
    pub branch: BranchName,
    /// Paths with staged, unstaged, or untracked changes.
    pub changed_paths: Vec<String>,
}

impl WorkingCopyStatus {
    /// Returns `true` when there are no pending changes.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.changed_paths.is_empty()
    }
}

/// Branch lifecycle contract for a single working copy.
#[async_trait]
pub trait BranchService: Send + Sync {
    /// Returns the branch tasks are created from and merged back into.
    fn default_branch(&self) -> &BranchName;

    /// Creates `task/<task_id>` from the default branch and checks it out.
    ///
    /// # Errors
    ///
    /// Returns [`BranchServiceError::BranchExists`] on a name collision or
    /// [`BranchServiceError::DirtyWorkingCopy`] when changes are pending.
    async fn create_branch(&self, task_id: TaskId) -> BranchServiceResult<BranchName>;

    /// Reports the checked-out branch.
    async fn current_branch(&self) -> BranchServiceResult<BranchName>;

    /// Switches to the default branch and force-deletes `branch`.
    async fn cleanup_branch(&self, branch: &BranchName) -> BranchServiceResult<()>;

    /// Switches to the default branch, merges `task/<task_id>` into it, and
    /// deletes the task branch.
    ///
    /// The working copy is left on the default branch whether or not the
    /// merge succeeds; a half-applied merge is aborted before the error is
    /// returned.
    async fn complete_task(&self, task_id: TaskId) -> BranchServiceResult<()>;

    /// Reports whether a local branch exists.
    async fn branch_exists(&self, branch: &BranchName) -> BranchServiceResult<bool>;

    /// Reports the checked-out branch and pending changes.
    async fn status(&self) -> BranchServiceResult<WorkingCopyStatus>;

    /// Reports the commit at `HEAD`, or `None` before the first commit.
    async fn head_commit(&self) -> BranchServiceResult<Option<CommitRef>>;
}

/// Version-control failures. Every variant carries a readable cause.
#[derive(Debug, Clone, Error)]
pub enum BranchServiceError {
    /// The branch to create already exists.
    #[error("branch {0} already exists")]
    BranchExists(BranchName),

    /// The branch to merge or delete does not exist.
    #[error("branch {0} does not exist")]
    BranchNotFound(BranchName),

    /// The working copy has pending changes.
    #[error("working copy has {changed} uncommitted change(s)")]
    DirtyWorkingCopy {
        /// Number of changed paths.
        changed: usize,
    },

    /// Merging a task branch failed; the merge has been aborted.
    #[error("merging {branch} failed: {cause}")]
    MergeFailed {
        /// Branch being merged.
        branch: BranchName,
        /// Underlying cause.
        cause: String,
    },

    /// The operation requires the task branch to be checked out.
    #[error("must be on task branch {expected}, currently on {actual}")]
    NotOnTaskBranch {
        /// Required branch.
        expected: BranchName,
        /// Branch actually checked out.
        actual: BranchName,
    },

    /// A version-control command exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// Command line, without the executable.
        command: String,
        /// Trimmed standard error.
        stderr: String,
    },

    /// A version-control command exceeded its time limit and was killed.
    #[error("`{command}` timed out after {seconds}s")]
    Timeout {
        /// Command line, without the executable.
        command: String,
        /// Configured limit in seconds.
        seconds: u64,
    },

    /// Command output could not be interpreted.
    #[error("unexpected version control output: {0}")]
    InvalidOutput(String),

    /// The operation was refused by the adapter.
    #[error("{operation} rejected: {cause}")]
    Rejected {
        /// Rejected operation.
        operation: BranchOperation,
        /// Reason given by the adapter.
        cause: String,
    },

    /// Process spawning or I/O failure.
    #[error("version control runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl BranchServiceError {
    /// Wraps a runtime error from the adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
