//! Validated scalar types for task, code location, and implementation fields.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a task title, matching `VARCHAR(255)`.
const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length for a file path, matching `VARCHAR(1024)`.
const MAX_FILE_PATH_LENGTH: usize = 1024;

/// Maximum length for a pattern type label, matching `VARCHAR(100)`.
const MAX_PATTERN_TYPE_LENGTH: usize = 100;

/// Lowest accepted priority or complexity score.
const MIN_SCORE: i64 = 1;

/// Highest accepted priority or complexity score.
const MAX_SCORE: i64 = 5;

/// Non-empty task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated task title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the value is blank or
    /// [`TaskDomainError::TitleTooLong`] when it exceeds 255 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let length = normalized.chars().count();
        if length > MAX_TITLE_LENGTH {
            return Err(TaskDomainError::TitleTooLong {
                max: MAX_TITLE_LENGTH,
                actual: length,
            });
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the title as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Task priority on a 1 (lowest) to 5 (highest) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    /// Creates a validated priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPriority`] outside `[1, 5]`.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        score(value)
            .map(Self)
            .ok_or(TaskDomainError::InvalidPriority(value))
    }

    /// Returns the numeric score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Task complexity on a 1 (trivial) to 5 (hardest) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Complexity(u8);

impl Complexity {
    /// Creates a validated complexity.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidComplexity`] outside `[1, 5]`.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        score(value)
            .map(Self)
            .ok_or(TaskDomainError::InvalidComplexity(value))
    }

    /// Returns the numeric score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

fn score(value: i64) -> Option<u8> {
    if (MIN_SCORE..=MAX_SCORE).contains(&value) {
        u8::try_from(value).ok()
    } else {
        None
    }
}

/// Repository-relative path of an attributed source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilePath(String);

impl FilePath {
    /// Creates a validated file path.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyFilePath`] for blank input or
    /// [`TaskDomainError::FilePathTooLong`] beyond 1024 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyFilePath);
        }
        let length = normalized.chars().count();
        if length > MAX_FILE_PATH_LENGTH {
            return Err(TaskDomainError::FilePathTooLong {
                max: MAX_FILE_PATH_LENGTH,
                actual: length,
            });
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// One-based source line number.
///
/// Bounded above by `i32::MAX` so it always fits the `INTEGER` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineNumber(u32);

impl LineNumber {
    /// Creates a validated line number.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidLineNumber`] below one or above
    /// `i32::MAX`.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        if value < 1 || value > i64::from(i32::MAX) {
            return Err(TaskDomainError::InvalidLineNumber(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| TaskDomainError::InvalidLineNumber(value))
    }

    /// Returns the numeric line.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LineNumber {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Free-text label classifying an implementation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternType(String);

impl PatternType {
    /// Creates a validated pattern type label.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyPatternType`] for blank input or
    /// [`TaskDomainError::PatternTypeTooLong`] beyond 100 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyPatternType);
        }
        let length = normalized.chars().count();
        if length > MAX_PATTERN_TYPE_LENGTH {
            return Err(TaskDomainError::PatternTypeTooLong {
                max: MAX_PATTERN_TYPE_LENGTH,
                actual: length,
            });
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Success rating of an implementation attempt, within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuccessRating(f64);

impl SuccessRating {
    /// Creates a validated success rating.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidSuccessRating`] for NaN, infinities,
    /// or values outside `[0, 1]`.
    pub fn new(value: f64) -> Result<Self, TaskDomainError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TaskDomainError::InvalidSuccessRating(value))
        }
    }

    /// Returns the rating value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}
