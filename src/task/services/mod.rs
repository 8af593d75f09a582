//! Application services for task lifecycle orchestration.

mod error;
mod lifecycle;

pub use error::{ErrorKind, TaskLifecycleError, TaskLifecycleResult};
pub use lifecycle::{
    AddCodeLocationRequest, CreateTaskRequest, CreatedTask, InitialCodeLocation,
    RecordImplementationRequest, TaskDetails, TaskLifecycleService,
};
