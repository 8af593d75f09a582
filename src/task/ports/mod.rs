//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by repositories and
//! task services.

pub mod branch;
pub mod store;

pub use branch::{
    BranchOperation, BranchService, BranchServiceError, BranchServiceResult, WorkingCopyStatus,
};
pub use store::{
    CodeLocationRecord, CodeLocationStore, ImplementationRecord, ImplementationStore, StoreError,
    StoreResult, TaskFilter, TaskRecord, TaskStore,
};
