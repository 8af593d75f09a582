//! Recorded implementation attempts against a task.

use super::{
    FieldUpdate, ImplementationId, PatternType, SuccessRating, TaskDomainError, TaskId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Unvalidated fields for an implementation record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImplementation {
    task_id: TaskId,
    pattern_type: String,
    pattern_data: String,
    success_rating: Option<f64>,
}

impl NewImplementation {
    /// Creates implementation fields without a rating.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        pattern_type: impl Into<String>,
        pattern_data: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            pattern_type: pattern_type.into(),
            pattern_data: pattern_data.into(),
            success_rating: None,
        }
    }

    /// Sets the success rating.
    #[must_use]
    pub const fn with_success_rating(mut self, success_rating: f64) -> Self {
        self.success_rating = Some(success_rating);
        self
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }
}

/// A logged attempt at solving part of a task.
///
/// Pattern data is opaque to this crate; callers usually store serialized
/// structured data in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    id: ImplementationId,
    task_id: TaskId,
    pattern_type: PatternType,
    pattern_data: String,
    success_rating: Option<SuccessRating>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted implementation record.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedImplementationData {
    /// Persisted identifier.
    pub id: ImplementationId,
    /// Owning task identifier.
    pub task_id: TaskId,
    /// Persisted pattern label.
    pub pattern_type: PatternType,
    /// Persisted pattern payload.
    pub pattern_data: String,
    /// Persisted rating, if any.
    pub success_rating: Option<SuccessRating>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Partial update for an implementation record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImplementationPatch {
    pattern_type: Option<String>,
    pattern_data: Option<String>,
    success_rating: FieldUpdate<f64>,
}

impl ImplementationPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pattern label.
    #[must_use]
    pub fn with_pattern_type(mut self, pattern_type: impl Into<String>) -> Self {
        self.pattern_type = Some(pattern_type.into());
        self
    }

    /// Replaces the pattern payload.
    #[must_use]
    pub fn with_pattern_data(mut self, pattern_data: impl Into<String>) -> Self {
        self.pattern_data = Some(pattern_data.into());
        self
    }

    /// Sets or clears the success rating.
    #[must_use]
    pub const fn with_success_rating(mut self, success_rating: FieldUpdate<f64>) -> Self {
        self.success_rating = success_rating;
        self
    }
}

impl Implementation {
    /// Creates a new implementation record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the pattern type or rating is invalid.
    pub fn create(
        fields: NewImplementation,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let NewImplementation {
            task_id,
            pattern_type,
            pattern_data,
            success_rating,
        } = fields;

        Ok(Self {
            id: ImplementationId::new(),
            task_id,
            pattern_type: PatternType::new(pattern_type)?,
            pattern_data,
            success_rating: success_rating.map(SuccessRating::new).transpose()?,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs an implementation record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedImplementationData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            pattern_type: data.pattern_type,
            pattern_data: data.pattern_data,
            success_rating: data.success_rating,
            created_at: data.created_at,
        }
    }

    /// Merges a patch onto a copy of this record and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when a patched field is invalid.
    pub fn apply_patch(&self, patch: ImplementationPatch) -> Result<Self, TaskDomainError> {
        let ImplementationPatch {
            pattern_type,
            pattern_data,
            success_rating,
        } = patch;

        let mut merged = self.clone();
        if let Some(label) = pattern_type {
            merged.pattern_type = PatternType::new(label)?;
        }
        if let Some(payload) = pattern_data {
            merged.pattern_data = payload;
        }
        merged.success_rating = success_rating.resolve(merged.success_rating, SuccessRating::new)?;
        Ok(merged)
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> ImplementationId {
        self.id
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the pattern label.
    #[must_use]
    pub const fn pattern_type(&self) -> &PatternType {
        &self.pattern_type
    }

    /// Returns the pattern payload.
    #[must_use]
    pub fn pattern_data(&self) -> &str {
        &self.pattern_data
    }

    /// Returns the success rating, if recorded.
    #[must_use]
    pub const fn success_rating(&self) -> Option<SuccessRating> {
        self.success_rating
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
