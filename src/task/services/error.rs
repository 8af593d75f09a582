//! Error types for the task lifecycle service.

use crate::task::{
    domain::TaskId,
    ports::BranchServiceError,
    repository::RepositoryError,
};
use thiserror::Error;

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Coarse error classes for transport collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, a disallowed request, or a stored row that fails
    /// re-validation. Not retried automatically.
    Validation,
    /// A referenced entity does not exist. Terminal.
    NotFound,
    /// A branch service operation failed, including the task-branch
    /// precondition.
    VersionControl,
    /// The store failed or rejected a write.
    Storage,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Branch service operation failed. Any persisted change made earlier in
    /// the same operation has been compensated.
    #[error(transparent)]
    Branch(#[from] BranchServiceError),

    /// The task is already completed.
    #[error("task {0} is already completed")]
    AlreadyCompleted(TaskId),

    /// A branch operation failed and restoring the previous task state also
    /// failed. The stored task may disagree with version control.
    #[error("task {task_id}: {cause}; restoring the previous state failed: {compensation}")]
    CompensationFailed {
        /// Affected task.
        task_id: TaskId,
        /// Branch failure that triggered compensation.
        cause: Box<BranchServiceError>,
        /// Failure raised while compensating.
        compensation: Box<RepositoryError>,
    },
}

impl TaskLifecycleError {
    /// Classifies the error for callers that map failures to responses.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Repository(RepositoryError::Validation(_) | RepositoryError::CorruptData { .. })
            | Self::AlreadyCompleted(_) => ErrorKind::Validation,
            Self::Repository(RepositoryError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Repository(RepositoryError::Storage(_)) | Self::CompensationFailed { .. } => {
                ErrorKind::Storage
            }
            Self::Branch(_) => ErrorKind::VersionControl,
        }
    }
}
