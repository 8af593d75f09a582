//! Tasktrace: task lifecycle tracking bound to version-control branches.
//!
//! Each task is persisted together with a `task/<id>` branch in a single
//! working copy. Code written for the task is attributed to it as code
//! locations tagged with the branch and commit, and completing the task
//! merges the branch back into the default branch.
//!
//! # Architecture
//!
//! Tasktrace follows hexagonal architecture principles:
//!
//! - **Domain**: validated value objects and entities
//! - **Ports**: store and branch service contracts
//! - **Adapters**: PostgreSQL, `git`, and in-memory implementations
//! - **Services**: the lifecycle orchestrator that keeps the store and the
//!   working copy consistent
//!
//! # Modules
//!
//! - [`task`]: task, code location, and implementation tracking
//! - [`cache`]: expiring key-value cache for derived reports
//! - [`config`]: TOML configuration with environment overrides
//! - [`telemetry`]: tracing subscriber installation

pub mod cache;
pub mod config;
pub mod task;
pub mod telemetry;
