//! Shared world state for task branch lifecycle BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tasktrace::task::{
    adapters::memory::{InMemoryBranchService, InMemoryStore},
    domain::{CodeLocation, Implementation, Task},
    services::{CreatedTask, TaskLifecycleError, TaskLifecycleService},
};

/// Service type used by the BDD world.
pub type TestLifecycleService =
    TaskLifecycleService<InMemoryStore, InMemoryBranchService, DefaultClock>;

/// Scenario world for task branch lifecycle behaviour tests.
pub struct TaskBranchWorld {
    pub service: TestLifecycleService,
    pub branches: Arc<InMemoryBranchService>,
    pub created: Option<CreatedTask>,
    pub last_location_result: Option<Result<CodeLocation, TaskLifecycleError>>,
    pub last_implementation: Option<Implementation>,
    pub last_completion_result: Option<Result<Task, TaskLifecycleError>>,
}

impl TaskBranchWorld {
    /// Creates a world over an empty store and a fresh working copy.
    #[must_use]
    pub fn new() -> Self {
        let branches = Arc::new(InMemoryBranchService::new());
        let service = TaskLifecycleService::new(
            Arc::new(InMemoryStore::new()),
            Arc::clone(&branches),
            Arc::new(DefaultClock),
        );

        Self {
            service,
            branches,
            created: None,
            last_location_result: None,
            last_implementation: None,
            last_completion_result: None,
        }
    }

    /// Returns the task created earlier in the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been created yet.
    pub fn created(&self) -> Result<&CreatedTask, eyre::Report> {
        self.created
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing created task in scenario world"))
    }
}

impl Default for TaskBranchWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskBranchWorld {
    TaskBranchWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
