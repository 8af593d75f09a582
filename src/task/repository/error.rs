//! Error types for validated repositories.

use crate::task::{domain::TaskDomainError, ports::StoreError};
use thiserror::Error;
use uuid::Uuid;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Entity label used in task errors.
pub(super) const TASK_ENTITY: &str = "task";

/// Entity label used in code location errors.
pub(super) const CODE_LOCATION_ENTITY: &str = "code location";

/// Entity label used in implementation errors.
pub(super) const IMPLEMENTATION_ENTITY: &str = "implementation";

/// Errors returned by validated repositories.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Caller-supplied fields or a merged patch failed validation. Storage
    /// is untouched.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// A stored row no longer satisfies its entity's invariants.
    #[error("corrupt {entity} row {id}: {reason}")]
    CorruptData {
        /// Entity label.
        entity: &'static str,
        /// Row identifier.
        id: Uuid,
        /// Validation failure.
        reason: String,
    },

    /// The referenced row does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity label.
        entity: &'static str,
        /// Requested identifier.
        id: Uuid,
    },

    /// The store rejected or failed the operation.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl RepositoryError {
    pub(super) const fn corrupt(entity: &'static str, id: Uuid, reason: String) -> Self {
        Self::CorruptData { entity, id, reason }
    }

    pub(super) const fn task_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: TASK_ENTITY,
            id,
        }
    }

    /// Returns `true` for [`RepositoryError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Maps a store error on a child write, turning a missing owner into a
/// task not-found error.
pub(super) fn map_child_store_error(err: StoreError) -> RepositoryError {
    match err {
        StoreError::ForeignKeyViolation { task_id, .. } => RepositoryError::task_not_found(task_id),
        other => RepositoryError::Storage(other),
    }
}
