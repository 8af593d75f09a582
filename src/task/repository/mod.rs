//! Validated repositories over the raw task stores.
//!
//! Repositories generate identifiers and timestamps on create, merge patches
//! onto previously validated entities before writing, and re-validate every
//! row read back from storage. A row that no longer satisfies its entity's
//! invariants surfaces as [`RepositoryError::CorruptData`].

mod code_location;
mod error;
mod implementation;
mod task;

pub use code_location::CodeLocationRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use implementation::ImplementationRepository;
pub use task::TaskRepository;
