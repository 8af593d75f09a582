//! Task lifecycle management bound to version-control branches.
//!
//! A task is created together with its `task/<id>` branch, collects code
//! locations recorded on that branch and implementation attempts, and is
//! completed by merging the branch into the default branch. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Validated persistence in [`repository`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod repository;
pub mod services;
