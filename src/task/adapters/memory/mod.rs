//! In-memory adapters for task persistence and version control.

mod branch;
mod store;

pub use branch::InMemoryBranchService;
pub use store::InMemoryStore;
