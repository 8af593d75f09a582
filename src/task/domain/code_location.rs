//! Source spans attributed to a task.

use super::{
    BranchName, CodeLocationId, CommitRef, FieldUpdate, FilePath, LineNumber, TaskDomainError,
    TaskId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Unvalidated fields for a code location about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCodeLocation {
    task_id: TaskId,
    file_path: String,
    start_line: i64,
    end_line: Option<i64>,
    branch_name: Option<BranchName>,
    commit_ref: Option<CommitRef>,
}

impl NewCodeLocation {
    /// Creates code location fields for a single-line span.
    #[must_use]
    pub fn new(task_id: TaskId, file_path: impl Into<String>, start_line: i64) -> Self {
        Self {
            task_id,
            file_path: file_path.into(),
            start_line,
            end_line: None,
            branch_name: None,
            commit_ref: None,
        }
    }

    /// Sets the inclusive end line.
    #[must_use]
    pub const fn with_end_line(mut self, end_line: i64) -> Self {
        self.end_line = Some(end_line);
        self
    }

    /// Tags the location with the branch it was written on.
    #[must_use]
    pub fn with_branch(mut self, branch_name: BranchName) -> Self {
        self.branch_name = Some(branch_name);
        self
    }

    /// Tags the location with the commit it was observed at.
    #[must_use]
    pub fn with_commit(mut self, commit_ref: CommitRef) -> Self {
        self.commit_ref = Some(commit_ref);
        self
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }
}

/// A file-and-line-range attribution of source code to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLocation {
    id: CodeLocationId,
    task_id: TaskId,
    file_path: FilePath,
    start_line: LineNumber,
    end_line: Option<LineNumber>,
    branch_name: Option<BranchName>,
    commit_ref: Option<CommitRef>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted code location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCodeLocationData {
    /// Persisted identifier.
    pub id: CodeLocationId,
    /// Owning task identifier.
    pub task_id: TaskId,
    /// Persisted file path.
    pub file_path: FilePath,
    /// Persisted start line.
    pub start_line: LineNumber,
    /// Persisted end line, if any.
    pub end_line: Option<LineNumber>,
    /// Persisted branch tag, if any.
    pub branch_name: Option<BranchName>,
    /// Persisted commit tag, if any.
    pub commit_ref: Option<CommitRef>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Partial update for a code location. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeLocationPatch {
    file_path: Option<String>,
    start_line: Option<i64>,
    end_line: FieldUpdate<i64>,
    branch_name: FieldUpdate<BranchName>,
    commit_ref: FieldUpdate<CommitRef>,
}

impl CodeLocationPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the file path.
    #[must_use]
    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    /// Replaces the start line.
    #[must_use]
    pub const fn with_start_line(mut self, start_line: i64) -> Self {
        self.start_line = Some(start_line);
        self
    }

    /// Sets or clears the end line.
    #[must_use]
    pub const fn with_end_line(mut self, end_line: FieldUpdate<i64>) -> Self {
        self.end_line = end_line;
        self
    }

    /// Sets or clears the branch tag.
    #[must_use]
    pub fn with_branch(mut self, branch_name: FieldUpdate<BranchName>) -> Self {
        self.branch_name = branch_name;
        self
    }

    /// Sets or clears the commit tag.
    #[must_use]
    pub fn with_commit(mut self, commit_ref: FieldUpdate<CommitRef>) -> Self {
        self.commit_ref = commit_ref;
        self
    }
}

impl CodeLocation {
    /// Creates a new code location.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the path or lines are invalid, or
    /// when the end line precedes the start line.
    pub fn create(fields: NewCodeLocation, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let NewCodeLocation {
            task_id,
            file_path,
            start_line,
            end_line,
            branch_name,
            commit_ref,
        } = fields;

        let start = LineNumber::new(start_line)?;
        let end = end_line.map(LineNumber::new).transpose()?;
        ensure_ordered(start, end)?;

        Ok(Self {
            id: CodeLocationId::new(),
            task_id,
            file_path: FilePath::new(file_path)?,
            start_line: start,
            end_line: end,
            branch_name,
            commit_ref,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a code location from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::LineRangeReversed`] when the stored span is
    /// reversed.
    pub fn from_persisted(data: PersistedCodeLocationData) -> Result<Self, TaskDomainError> {
        ensure_ordered(data.start_line, data.end_line)?;
        Ok(Self {
            id: data.id,
            task_id: data.task_id,
            file_path: data.file_path,
            start_line: data.start_line,
            end_line: data.end_line,
            branch_name: data.branch_name,
            commit_ref: data.commit_ref,
            created_at: data.created_at,
        })
    }

    /// Returns the location identifier.
    #[must_use]
    pub const fn id(&self) -> CodeLocationId {
        self.id
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the file path.
    #[must_use]
    pub const fn file_path(&self) -> &FilePath {
        &self.file_path
    }

    /// Returns the first line of the span.
    #[must_use]
    pub const fn start_line(&self) -> LineNumber {
        self.start_line
    }

    /// Returns the last line of the span, if recorded.
    #[must_use]
    pub const fn end_line(&self) -> Option<LineNumber> {
        self.end_line
    }

    /// Returns the branch the span was recorded on, if any.
    #[must_use]
    pub const fn branch_name(&self) -> Option<&BranchName> {
        self.branch_name.as_ref()
    }

    /// Returns the commit the span was recorded at, if any.
    #[must_use]
    pub const fn commit_ref(&self) -> Option<&CommitRef> {
        self.commit_ref.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Merges a patch onto a copy of this location and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when a patched field is invalid or the
    /// merged span is reversed.
    pub fn apply_patch(&self, patch: CodeLocationPatch) -> Result<Self, TaskDomainError> {
        let CodeLocationPatch {
            file_path,
            start_line,
            end_line,
            branch_name,
            commit_ref,
        } = patch;

        let mut merged = self.clone();
        if let Some(path) = file_path {
            merged.file_path = FilePath::new(path)?;
        }
        if let Some(line) = start_line {
            merged.start_line = LineNumber::new(line)?;
        }
        merged.end_line = end_line.resolve(merged.end_line, LineNumber::new)?;
        merged.branch_name =
            branch_name.resolve(merged.branch_name.take(), Ok::<_, TaskDomainError>)?;
        merged.commit_ref =
            commit_ref.resolve(merged.commit_ref.take(), Ok::<_, TaskDomainError>)?;
        ensure_ordered(merged.start_line, merged.end_line)?;
        Ok(merged)
    }
}

fn ensure_ordered(start: LineNumber, end: Option<LineNumber>) -> Result<(), TaskDomainError> {
    match end {
        Some(last) if last < start => Err(TaskDomainError::LineRangeReversed {
            start: start.value(),
            end: last.value(),
        }),
        _ => Ok(()),
    }
}
