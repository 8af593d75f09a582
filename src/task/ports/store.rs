//! Row-level store ports for the `tasks`, `code_locations`, and
//! `implementations` tables.
//!
//! Stores move primitive rows and never validate them; validation and
//! reconstruction belong to the repositories in [`crate::task::repository`].

use crate::task::domain::{
    CodeLocationId, Complexity, ImplementationId, Priority, TaskId, TaskStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Raw row of the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Task identifier.
    pub id: Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Priority score.
    pub priority: i32,
    /// Complexity score.
    pub complexity: i32,
    /// Status in canonical storage form.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Raw row of the `code_locations` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLocationRecord {
    /// Location identifier.
    pub id: Uuid,
    /// Owning task identifier.
    pub task_id: Uuid,
    /// Attributed file path.
    pub file_path: String,
    /// First line of the span.
    pub start_line: i32,
    /// Optional last line of the span.
    pub end_line: Option<i32>,
    /// Optional branch tag.
    pub branch_name: Option<String>,
    /// Optional commit tag.
    pub commit_ref: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Raw row of the `implementations` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplementationRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Owning task identifier.
    pub task_id: Uuid,
    /// Pattern label.
    pub pattern_type: String,
    /// Pattern payload.
    pub pattern_data: String,
    /// Optional success rating.
    pub success_rating: Option<f64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Optional predicates applied when listing tasks.
///
/// Results are ordered by creation time, then identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks in this status.
    pub status: Option<TaskStatus>,
    /// Only tasks with at least this priority.
    pub min_priority: Option<Priority>,
    /// Only tasks with at most this complexity.
    pub max_complexity: Option<Complexity>,
    /// Only tasks whose title contains this text, case-insensitively.
    pub title_contains: Option<String>,
}

impl TaskFilter {
    /// Creates a filter that matches every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to a status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts results to a minimum priority.
    #[must_use]
    pub const fn with_min_priority(mut self, priority: Priority) -> Self {
        self.min_priority = Some(priority);
        self
    }

    /// Restricts results to a maximum complexity.
    #[must_use]
    pub const fn with_max_complexity(mut self, complexity: Complexity) -> Self {
        self.max_complexity = Some(complexity);
        self
    }

    /// Restricts results to titles containing the given text.
    #[must_use]
    pub fn with_title_containing(mut self, text: impl Into<String>) -> Self {
        self.title_contains = Some(text.into());
        self
    }

    /// Returns `true` when the record satisfies every set predicate.
    #[must_use]
    pub fn matches(&self, record: &TaskRecord) -> bool {
        let status_matches = self
            .status
            .is_none_or(|status| record.status == status.as_str());
        let priority_matches = self
            .min_priority
            .is_none_or(|priority| record.priority >= i32::from(priority.value()));
        let complexity_matches = self
            .max_complexity
            .is_none_or(|complexity| record.complexity <= i32::from(complexity.value()));
        let title_matches = self.title_contains.as_deref().is_none_or(|needle| {
            record
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });

        status_matches && priority_matches && complexity_matches && title_matches
    }
}

/// Persistence contract for `tasks` rows.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a new row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] when the identifier is taken.
    async fn insert_task(&self, record: &TaskRecord) -> StoreResult<()>;

    /// Selects a row by identifier.
    async fn select_task(&self, id: TaskId) -> StoreResult<Option<TaskRecord>>;

    /// Selects every row matching the filter.
    async fn select_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<TaskRecord>>;

    /// Overwrites an existing row. Returns `false` when no row matched.
    async fn update_task(&self, record: &TaskRecord) -> StoreResult<bool>;

    /// Deletes a row. Returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StillReferenced`] while dependent rows exist.
    async fn delete_task(&self, id: TaskId) -> StoreResult<bool>;
}

/// Persistence contract for `code_locations` rows.
#[async_trait]
pub trait CodeLocationStore: Send + Sync {
    /// Inserts a new row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignKeyViolation`] when the owning task does
    /// not exist.
    async fn insert_code_location(&self, record: &CodeLocationRecord) -> StoreResult<()>;

    /// Selects a row by identifier.
    async fn select_code_location(
        &self,
        id: CodeLocationId,
    ) -> StoreResult<Option<CodeLocationRecord>>;

    /// Selects every row owned by a task, oldest first.
    async fn select_code_locations_by_task(
        &self,
        task_id: TaskId,
    ) -> StoreResult<Vec<CodeLocationRecord>>;

    /// Overwrites an existing row. Returns `false` when no row matched.
    async fn update_code_location(&self, record: &CodeLocationRecord) -> StoreResult<bool>;

    /// Deletes a row. Returns `false` when no row matched.
    async fn delete_code_location(&self, id: CodeLocationId) -> StoreResult<bool>;
}

/// Persistence contract for `implementations` rows.
#[async_trait]
pub trait ImplementationStore: Send + Sync {
    /// Inserts a new row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignKeyViolation`] when the owning task does
    /// not exist.
    async fn insert_implementation(&self, record: &ImplementationRecord) -> StoreResult<()>;

    /// Selects a row by identifier.
    async fn select_implementation(
        &self,
        id: ImplementationId,
    ) -> StoreResult<Option<ImplementationRecord>>;

    /// Selects every row owned by a task, oldest first.
    async fn select_implementations_by_task(
        &self,
        task_id: TaskId,
    ) -> StoreResult<Vec<ImplementationRecord>>;

    /// Overwrites an existing row. Returns `false` when no row matched.
    async fn update_implementation(&self, record: &ImplementationRecord) -> StoreResult<bool>;

    /// Deletes a row. Returns `false` when no row matched.
    async fn delete_implementation(&self, id: ImplementationId) -> StoreResult<bool>;
}

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A row with the same primary key already exists.
    #[error("duplicate key {id} in {table}")]
    DuplicateKey {
        /// Table name.
        table: &'static str,
        /// Conflicting identifier.
        id: Uuid,
    },

    /// A child row references a task that does not exist.
    #[error("{table} row references missing task {task_id}")]
    ForeignKeyViolation {
        /// Table name of the child row.
        table: &'static str,
        /// Referenced task identifier.
        task_id: Uuid,
    },

    /// A task row cannot be deleted while child rows reference it.
    #[error("task {0} is still referenced by code locations or implementations")]
    StillReferenced(Uuid),

    /// The store could not hand out a connection.
    #[error("store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// Any other persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a connection acquisition failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
