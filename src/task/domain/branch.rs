//! Branch and commit value objects for task-branch binding.

use super::{TaskDomainError, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a validated branch name, matching `VARCHAR(200)`.
const MAX_BRANCH_NAME_LENGTH: usize = 200;

/// Conventional default branch name.
const DEFAULT_BRANCH: &str = "main";

/// Prefix shared by every task branch.
const TASK_BRANCH_PREFIX: &str = "task/";

/// Shortest accepted abbreviated object name.
const MIN_COMMIT_REF_LENGTH: usize = 7;

/// Longest accepted object name (SHA-256 repositories).
const MAX_COMMIT_REF_LENGTH: usize = 64;

/// Validated Git branch name.
///
/// A subset of `git check-ref-format --branch`: non-empty, no whitespace or
/// control characters, no `..`, `~`, `^`, `:`, `?`, `*`, `[` or `\`, no
/// leading `-` or `/`, no trailing `/`, `.` or `.lock`.
///
/// # Examples
///
///     use tasktrace::task::domain::BranchName;
///
///     let name = BranchName::new("task/abc").expect("valid");
///     assert_eq!(name.as_str(), "task/abc");
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchName(String);

impl BranchName {
    /// Creates a validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidBranchName`] when the value is not a
    /// usable branch name.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if Self::is_invalid_branch_name(normalized) {
            return Err(TaskDomainError::InvalidBranchName(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the conventional default branch, `main`.
    #[must_use]
    pub fn main() -> Self {
        Self(String::from(DEFAULT_BRANCH))
    }

    /// Returns the branch bound to the given task: `task/<id>`.
    #[must_use]
    pub fn for_task(task_id: TaskId) -> Self {
        Self(format!("{TASK_BRANCH_PREFIX}{task_id}"))
    }

    fn is_invalid_branch_name(name: &str) -> bool {
        let is_empty = name.is_empty();
        let exceeds_length_limit = name.len() > MAX_BRANCH_NAME_LENGTH;
        let has_forbidden_char = name.chars().any(|character| {
            character.is_whitespace()
                || character.is_control()
                || matches!(character, '~' | '^' | ':' | '?' | '*' | '[' | '\\')
        });
        let has_forbidden_sequence =
            name.contains("..") || name.contains("//") || name.contains("@{");
        let has_bad_edges = name.starts_with('-')
            || name.starts_with('/')
            || name.ends_with('/')
            || name.ends_with('.')
            || name.ends_with(".lock");

        is_empty
            || exceeds_length_limit
            || has_forbidden_char
            || has_forbidden_sequence
            || has_bad_edges
    }

    /// Returns the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl TryFrom<&str> for BranchName {
    type Error = TaskDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Hexadecimal commit object name, full or abbreviated.
///
/// Stored lowercase so that equal commits compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitRef(String);

impl CommitRef {
    /// Creates a validated commit reference.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidCommitRef`] unless the value is
    /// 7 to 64 hexadecimal characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        let has_valid_length =
            (MIN_COMMIT_REF_LENGTH..=MAX_COMMIT_REF_LENGTH).contains(&normalized.len());
        let is_hex = normalized.chars().all(|character| character.is_ascii_hexdigit());

        if !has_valid_length || !is_hex {
            return Err(TaskDomainError::InvalidCommitRef(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the commit reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
