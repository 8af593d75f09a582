//! Task lifecycle orchestration across the store and the branch service.
//!
//! Each write-side operation persists first and drives version control
//! second. When the version-control step fails after a persisted change, the
//! change is compensated before the error is returned.

use super::error::{TaskLifecycleError, TaskLifecycleResult};
use crate::task::{
    domain::{
        BranchName, CodeLocation, FilePath, Implementation, LineNumber, NewCodeLocation,
        NewImplementation, NewTask, Task, TaskDomainError, TaskId, TaskStatus,
    },
    ports::{
        BranchService, BranchServiceError, CodeLocationStore, ImplementationStore, TaskFilter,
        TaskStore,
    },
    repository::{
        CodeLocationRepository, ImplementationRepository, RepositoryError, TaskRepository,
    },
};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Code span to attach to a task at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialCodeLocation {
    file_path: String,
    start_line: i64,
    end_line: Option<i64>,
}

impl InitialCodeLocation {
    /// Creates a span starting at `start_line`.
    #[must_use]
    pub fn new(file_path: impl Into<String>, start_line: i64) -> Self {
        Self {
            file_path: file_path.into(),
            start_line,
            end_line: None,
        }
    }

    /// Sets the inclusive end line.
    #[must_use]
    pub const fn with_end_line(mut self, end_line: i64) -> Self {
        self.end_line = Some(end_line);
        self
    }

    /// Checks the span before any write happens.
    fn validate(&self) -> Result<(), TaskDomainError> {
        FilePath::new(self.file_path.as_str())?;
        let start = LineNumber::new(self.start_line)?;
        if let Some(raw_end) = self.end_line {
            let end = LineNumber::new(raw_end)?;
            if end < start {
                return Err(TaskDomainError::LineRangeReversed {
                    start: start.value(),
                    end: end.value(),
                });
            }
        }
        Ok(())
    }

    fn into_new(self, task_id: TaskId) -> NewCodeLocation {
        let mut fields = NewCodeLocation::new(task_id, self.file_path, self.start_line);
        if let Some(end_line) = self.end_line {
            fields = fields.with_end_line(end_line);
        }
        fields
    }
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    priority: i64,
    complexity: i64,
    initial_location: Option<InitialCodeLocation>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, priority: i64, complexity: i64) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority,
            complexity,
            initial_location: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a code span to record on the new task branch.
    #[must_use]
    pub fn with_initial_location(mut self, location: InitialCodeLocation) -> Self {
        self.initial_location = Some(location);
        self
    }
}

/// Request payload for attributing code to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCodeLocationRequest {
    task_id: TaskId,
    file_path: String,
    start_line: i64,
    end_line: Option<i64>,
}

impl AddCodeLocationRequest {
    /// Creates a request for a span starting at `start_line`.
    #[must_use]
    pub fn new(task_id: TaskId, file_path: impl Into<String>, start_line: i64) -> Self {
        Self {
            task_id,
            file_path: file_path.into(),
            start_line,
            end_line: None,
        }
    }

    /// Sets the inclusive end line.
    #[must_use]
    pub const fn with_end_line(mut self, end_line: i64) -> Self {
        self.end_line = Some(end_line);
        self
    }
}

/// Request payload for recording an implementation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordImplementationRequest {
    task_id: TaskId,
    pattern_type: String,
    pattern_data: String,
    success_rating: Option<f64>,
}

impl RecordImplementationRequest {
    /// Creates a request without a success rating.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        pattern_type: impl Into<String>,
        pattern_data: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            pattern_type: pattern_type.into(),
            pattern_data: pattern_data.into(),
            success_rating: None,
        }
    }

    /// Sets the success rating.
    #[must_use]
    pub const fn with_success_rating(mut self, success_rating: f64) -> Self {
        self.success_rating = Some(success_rating);
        self
    }
}

/// Result of creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedTask {
    /// The persisted task.
    pub task: Task,
    /// Branch bound to the task, checked out on return.
    pub branch: BranchName,
    /// The initial code location, when one was requested.
    pub code_location: Option<CodeLocation>,
}

/// A task with every row attributed to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDetails {
    /// The task.
    pub task: Task,
    /// Code locations owned by the task, oldest first.
    pub code_locations: Vec<CodeLocation>,
    /// Implementation records owned by the task, oldest first.
    pub implementations: Vec<Implementation>,
}

/// Task lifecycle orchestration service for one working copy.
///
/// Operations that read or move the checked-out branch, and operations that
/// may compensate a status write, run one at a time under the working-copy
/// guard.
pub struct TaskLifecycleService<S, B, C>
where
    S: TaskStore + CodeLocationStore + ImplementationStore,
    B: BranchService,
    C: Clock + Send + Sync,
{
    tasks: TaskRepository<S, C>,
    code_locations: CodeLocationRepository<S, C>,
    implementations: ImplementationRepository<S, C>,
    branches: Arc<B>,
    working_copy: Mutex<()>,
}

impl<S, B, C> TaskLifecycleService<S, B, C>
where
    S: TaskStore + CodeLocationStore + ImplementationStore,
    B: BranchService,
    C: Clock + Send + Sync,
{
    /// Creates a service over a store and the branch service for one working copy.
    #[must_use]
    pub fn new(store: Arc<S>, branches: Arc<B>, clock: Arc<C>) -> Self {
        Self {
            tasks: TaskRepository::new(Arc::clone(&store), Arc::clone(&clock)),
            code_locations: CodeLocationRepository::new(Arc::clone(&store), Arc::clone(&clock)),
            implementations: ImplementationRepository::new(store, clock),
            branches,
            working_copy: Mutex::new(()),
        }
    }

    /// Creates a task and its branch, optionally recording an initial code
    /// location on that branch.
    ///
    /// The task row is written first. When branch creation then fails, any
    /// partially created branch is removed and the error is returned; the
    /// task row is kept and logged as branch-less. When only the initial code
    /// location fails, the task and its checked-out branch are both kept.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] for invalid input or
    /// persistence failure (no branch is created), or
    /// [`TaskLifecycleError::Branch`] when the branch cannot be created.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<CreatedTask> {
        let CreateTaskRequest {
            title,
            description,
            priority,
            complexity,
            initial_location,
        } = request;
        if let Some(location) = initial_location.as_ref() {
            location.validate().map_err(RepositoryError::Validation)?;
        }

        let mut fields = NewTask::new(title, priority, complexity);
        if let Some(text) = description {
            fields = fields.with_description(text);
        }

        let _guard = self.working_copy.lock().await;
        let task = self.tasks.create(fields).await?;
        let task_id = task.id();

        let branch = match self.branches.create_branch(task_id).await {
            Ok(branch) => branch,
            Err(err) => {
                if !matches!(err, BranchServiceError::BranchExists(_)) {
                    self.remove_orphan_branch(task_id).await;
                }
                warn!(
                    task_id = %task_id,
                    error = %err,
                    "branch creation failed; task row kept without a branch"
                );
                return Err(err.into());
            }
        };
        info!(task_id = %task_id, branch = %branch, "created task");

        let mut code_location = None;
        if let Some(location) = initial_location {
            let recorded = self
                .record_location_on_branch(location.into_new(task_id), &branch)
                .await
                .inspect_err(|err| {
                    warn!(
                        task_id = %task_id,
                        branch = %branch,
                        error = %err,
                        "initial code location not recorded; task and branch kept"
                    );
                })?;
            code_location = Some(recorded);
        }

        Ok(CreatedTask {
            task,
            branch,
            code_location,
        })
    }

    /// Attributes a code span to a task.
    ///
    /// The task's branch must be checked out. The location is tagged with
    /// that branch and the current `HEAD` commit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the task does not
    /// exist or the span is invalid, or [`TaskLifecycleError::Branch`] with
    /// [`BranchServiceError::NotOnTaskBranch`] when another branch is checked
    /// out. Nothing is written on error.
    pub async fn add_code_location(
        &self,
        request: AddCodeLocationRequest,
    ) -> TaskLifecycleResult<CodeLocation> {
        let AddCodeLocationRequest {
            task_id,
            file_path,
            start_line,
            end_line,
        } = request;

        let _guard = self.working_copy.lock().await;
        self.tasks.get(task_id).await?;

        let expected = BranchName::for_task(task_id);
        let actual = self.branches.current_branch().await?;
        if actual != expected {
            return Err(BranchServiceError::NotOnTaskBranch { expected, actual }.into());
        }

        let mut fields = NewCodeLocation::new(task_id, file_path, start_line);
        if let Some(end) = end_line {
            fields = fields.with_end_line(end);
        }
        self.record_location_on_branch(fields, &expected).await
    }

    /// Records an implementation attempt against a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the task does not
    /// exist or a field is invalid.
    pub async fn record_implementation(
        &self,
        request: RecordImplementationRequest,
    ) -> TaskLifecycleResult<Implementation> {
        let RecordImplementationRequest {
            task_id,
            pattern_type,
            pattern_data,
            success_rating,
        } = request;

        self.tasks.get(task_id).await?;
        let mut fields = NewImplementation::new(task_id, pattern_type, pattern_data);
        if let Some(rating) = success_rating {
            fields = fields.with_success_rating(rating);
        }
        let implementation = self.implementations.create(fields).await?;
        info!(
            task_id = %task_id,
            implementation_id = %implementation.id(),
            pattern_type = %implementation.pattern_type(),
            "recorded implementation"
        );
        Ok(implementation)
    }

    /// Marks a task completed and merges its branch into the default branch.
    ///
    /// When the merge fails the previously stored task is written back, so
    /// the status after the call equals the status before it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::AlreadyCompleted`] for a completed task
    /// (nothing is touched), [`TaskLifecycleError::Repository`] when the task
    /// does not exist or the write fails, [`TaskLifecycleError::Branch`] when
    /// the merge fails and was compensated, or
    /// [`TaskLifecycleError::CompensationFailed`] when compensation itself
    /// failed.
    pub async fn complete_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let _guard = self.working_copy.lock().await;
        let previous = self.tasks.get(task_id).await?;
        if previous.status() == TaskStatus::Completed {
            return Err(TaskLifecycleError::AlreadyCompleted(task_id));
        }

        let completed = self
            .tasks
            .update_status(task_id, TaskStatus::Completed)
            .await?;

        if let Err(branch_err) = self.branches.complete_task(task_id).await {
            warn!(
                task_id = %task_id,
                error = %branch_err,
                restored_status = %previous.status(),
                "branch completion failed; restoring previous task state"
            );
            if let Err(restore_err) = self.tasks.restore(&previous).await {
                error!(
                    task_id = %task_id,
                    error = %restore_err,
                    "failed to restore task after branch completion failure"
                );
                return Err(TaskLifecycleError::CompensationFailed {
                    task_id,
                    cause: Box::new(branch_err),
                    compensation: Box::new(restore_err),
                });
            }
            return Err(branch_err.into());
        }

        info!(
            task_id = %task_id,
            target = %self.branches.default_branch(),
            "completed task"
        );
        Ok(completed)
    }

    /// Loads a task together with its code locations and implementations.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] with a not-found error
    /// when the task does not exist, or any read failure.
    pub async fn get_task_with_details(&self, task_id: TaskId) -> TaskLifecycleResult<TaskDetails> {
        let task = self.tasks.get(task_id).await?;
        let (code_locations, implementations) = tokio::join!(
            self.code_locations.find_by_task_id(task_id),
            self.implementations.find_by_task_id(task_id),
        );
        Ok(TaskDetails {
            task,
            code_locations: code_locations?,
            implementations: implementations?,
        })
    }

    /// Writes a task status directly, without transition checks or branch
    /// operations.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the task does not
    /// exist or the write fails.
    pub async fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> TaskLifecycleResult<Task> {
        // Serialized with completion so a compensating write cannot clobber it.
        let _guard = self.working_copy.lock().await;
        let task = self.tasks.update_status(task_id, status).await?;
        info!(task_id = %task_id, status = %status, "updated task status");
        Ok(task)
    }

    /// Lists tasks matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] on read failure.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.tasks.find_all(filter).await?)
    }

    /// Looks up a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] on read failure.
    pub async fn find_task(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.tasks.find_by_id(task_id).await?)
    }

    async fn record_location_on_branch(
        &self,
        fields: NewCodeLocation,
        branch: &BranchName,
    ) -> TaskLifecycleResult<CodeLocation> {
        let mut tagged = fields.with_branch(branch.clone());
        if let Some(commit) = self.branches.head_commit().await? {
            tagged = tagged.with_commit(commit);
        }
        let location = self.code_locations.create(tagged).await?;
        info!(
            task_id = %location.task_id(),
            code_location_id = %location.id(),
            file_path = %location.file_path(),
            branch = %branch,
            "recorded code location"
        );
        Ok(location)
    }

    /// Best-effort removal of a branch left behind by a failed creation.
    async fn remove_orphan_branch(&self, task_id: TaskId) {
        let branch = BranchName::for_task(task_id);
        match self.branches.branch_exists(&branch).await {
            Ok(true) => {
                if let Err(err) = self.branches.cleanup_branch(&branch).await {
                    warn!(branch = %branch, error = %err, "failed to remove orphaned branch");
                }
            }
            Ok(false) => {}
            Err(err) => {
                warn!(branch = %branch, error = %err, "could not check for orphaned branch");
            }
        }
    }
}
