//! Branch service adapter driving a local Git working copy.
//!
//! Every operation shells out to the `git` executable. At most one git
//! subprocess runs at a time per service instance, and each invocation is
//! bounded by the configured timeout.

mod command;
mod service;

pub use service::GitBranchService;
