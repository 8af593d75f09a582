//! Domain model for task, code location, and implementation tracking.
//!
//! The task domain models validated task records, the source spans and
//! implementation attempts attributed to them, and the branch naming that
//! binds a task to version control. Infrastructure concerns stay outside
//! this boundary.

mod branch;
mod code_location;
mod error;
mod ids;
mod implementation;
mod patch;
mod task;
mod values;

pub use branch::{BranchName, CommitRef};
pub use code_location::{
    CodeLocation, CodeLocationPatch, NewCodeLocation, PersistedCodeLocationData,
};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{CodeLocationId, ImplementationId, TaskId};
pub use implementation::{
    Implementation, ImplementationPatch, NewImplementation, PersistedImplementationData,
};
pub use patch::FieldUpdate;
pub use task::{NewTask, PersistedTaskData, Task, TaskPatch, TaskStatus};
pub use values::{
    Complexity, FilePath, LineNumber, PatternType, Priority, SuccessRating, TaskTitle,
};
