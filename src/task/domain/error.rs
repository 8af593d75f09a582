//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the storage limit.
    #[error("task title exceeds {max} characters (got {actual})")]
    TitleTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected value.
        actual: usize,
    },

    /// The priority is outside `[1, 5]`.
    #[error("priority must be between 1 and 5, got {0}")]
    InvalidPriority(i64),

    /// The complexity is outside `[1, 5]`.
    #[error("complexity must be between 1 and 5, got {0}")]
    InvalidComplexity(i64),

    /// The file path is empty after trimming.
    #[error("file path must not be empty")]
    EmptyFilePath,

    /// The file path exceeds the storage limit.
    #[error("file path exceeds {max} characters (got {actual})")]
    FilePathTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected value.
        actual: usize,
    },

    /// A line number is below one.
    #[error("line numbers start at 1, got {0}")]
    InvalidLineNumber(i64),

    /// The end line precedes the start line.
    #[error("end line {end} precedes start line {start}")]
    LineRangeReversed {
        /// Start of the span.
        start: u32,
        /// End of the span.
        end: u32,
    },

    /// The branch name is not a usable git ref name.
    #[error("invalid branch name '{0}'")]
    InvalidBranchName(String),

    /// The commit reference is not an abbreviated or full hex object name.
    #[error("invalid commit reference '{0}'")]
    InvalidCommitRef(String),

    /// The implementation pattern type is empty after trimming.
    #[error("pattern type must not be empty")]
    EmptyPatternType,

    /// The implementation pattern type exceeds the storage limit.
    #[error("pattern type exceeds {max} characters (got {actual})")]
    PatternTypeTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected value.
        actual: usize,
    },

    /// The success rating is not a finite value in `[0, 1]`.
    #[error("success rating must be within [0, 1], got {0}")]
    InvalidSuccessRating(f64),

    /// The last-update timestamp precedes the creation timestamp.
    #[error("updated timestamp precedes created timestamp")]
    TimestampsOutOfOrder,
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
