//! Task aggregate root and related lifecycle types.

use super::{
    Complexity, FieldUpdate, ParseTaskStatusError, Priority, TaskDomainError, TaskId, TaskTitle,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
///
/// The nominal flow is `Created -> InProgress -> Paused -> Completed`, but
/// only creation and completion carry branch consequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task and branch exist; work has not started.
    Created,
    /// Task is being implemented.
    InProgress,
    /// Task work is temporarily paused.
    Paused,
    /// Task branch has been merged and removed.
    Completed,
}

impl TaskStatus {
    /// All statuses in nominal lifecycle order.
    pub const ALL: [Self; 4] = [Self::Created, Self::InProgress, Self::Paused, Self::Completed];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "created" => Ok(Self::Created),
            "in_progress" => Ok(Self::InProgress),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Unvalidated fields for a task about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    description: Option<String>,
    priority: i64,
    complexity: i64,
}

impl NewTask {
    /// Creates task fields with the required values.
    #[must_use]
    pub fn new(title: impl Into<String>, priority: i64, complexity: i64) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority,
            complexity,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: Option<String>,
    priority: Priority,
    complexity: Complexity,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted complexity.
    pub complexity: Complexity,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a task. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    title: Option<String>,
    description: FieldUpdate<String>,
    priority: Option<i64>,
    complexity: Option<i64>,
    status: Option<TaskStatus>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets or clears the description.
    #[must_use]
    pub fn with_description(mut self, description: FieldUpdate<String>) -> Self {
        self.description = description;
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Replaces the complexity.
    #[must_use]
    pub const fn with_complexity(mut self, complexity: i64) -> Self {
        self.complexity = Some(complexity);
        self
    }

    /// Replaces the status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_unchanged()
            && self.priority.is_none()
            && self.complexity.is_none()
            && self.status.is_none()
    }
}

impl Task {
    /// Creates a new task in the [`TaskStatus::Created`] state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when any field fails validation.
    pub fn create(fields: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let NewTask {
            title,
            description,
            priority,
            complexity,
        } = fields;
        let timestamp = clock.utc();

        Ok(Self {
            id: TaskId::new(),
            title: TaskTitle::new(title)?,
            description: normalize_description(description),
            priority: Priority::new(priority)?,
            complexity: Complexity::new(complexity)?,
            status: TaskStatus::Created,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TimestampsOutOfOrder`] when the update
    /// timestamp precedes creation.
    pub fn from_persisted(data: PersistedTaskData) -> Result<Self, TaskDomainError> {
        if data.updated_at < data.created_at {
            return Err(TaskDomainError::TimestampsOutOfOrder);
        }
        Ok(Self {
            id: data.id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            complexity: data.complexity,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the task description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the task priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the task complexity.
    #[must_use]
    pub const fn complexity(&self) -> Complexity {
        self.complexity
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Merges a patch onto a copy of this task and validates the result.
    ///
    /// `self` is left untouched when validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when a patched field is invalid.
    pub fn apply_patch(
        &self,
        patch: TaskPatch,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let TaskPatch {
            title,
            description,
            priority,
            complexity,
            status,
        } = patch;

        let mut merged = self.clone();
        if let Some(new_title) = title {
            merged.title = TaskTitle::new(new_title)?;
        }
        merged.description = match description {
            FieldUpdate::Unchanged => merged.description,
            FieldUpdate::Clear => None,
            FieldUpdate::Set(text) => normalize_description(Some(text)),
        };
        if let Some(new_priority) = priority {
            merged.priority = Priority::new(new_priority)?;
        }
        if let Some(new_complexity) = complexity {
            merged.complexity = Complexity::new(new_complexity)?;
        }
        if let Some(new_status) = status {
            merged.status = new_status;
        }
        merged.touch(clock);
        Ok(merged)
    }

    /// Advances `updated_at` to the clock time, never moving it backwards.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc().max(self.created_at);
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.and_then(|text| {
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}
