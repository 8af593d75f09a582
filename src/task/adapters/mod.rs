//! Adapter implementations for the task store and branch service ports.
//!
//! - [`memory`]: in-memory store and branch service for deterministic tests
//! - [`postgres`]: Diesel-backed `PostgreSQL` store
//! - [`git`]: branch service driving a local Git working copy

pub mod git;
pub mod memory;
pub mod postgres;
