//! Validated repository for task rows.

use super::error::{RepositoryError, RepositoryResult, TASK_ENTITY};
use crate::task::{
    domain::{
        Complexity, NewTask, PersistedTaskData, Priority, Task, TaskDomainError, TaskId,
        TaskPatch, TaskStatus, TaskTitle,
    },
    ports::{TaskFilter, TaskRecord, TaskStore},
};
use mockable::Clock;
use std::sync::Arc;

/// Task repository over a [`TaskStore`].
#[derive(Clone)]
pub struct TaskRepository<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> TaskRepository<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a repository over `store` stamping times from `clock`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Validates and inserts a new task in the `created` state.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Validation`] for invalid fields, or
    /// [`RepositoryError::Storage`] when the insert fails.
    pub async fn create(&self, fields: NewTask) -> RepositoryResult<Task> {
        let task = Task::create(fields, &*self.clock)?;
        self.store.insert_task(&task_to_record(&task)).await?;
        Ok(task)
    }

    /// Looks up a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::CorruptData`] when the stored row fails
    /// validation, or [`RepositoryError::Storage`] on store failure.
    pub async fn find_by_id(&self, id: TaskId) -> RepositoryResult<Option<Task>> {
        self.store
            .select_task(id)
            .await?
            .map(record_to_task)
            .transpose()
    }

    /// Looks up a task that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no row matches, or any
    /// error of [`Self::find_by_id`].
    pub async fn get(&self, id: TaskId) -> RepositoryResult<Task> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::task_not_found(id.into_inner()))
    }

    /// Lists tasks matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::CorruptData`] when any matched row fails
    /// validation, or [`RepositoryError::Storage`] on store failure.
    pub async fn find_all(&self, filter: &TaskFilter) -> RepositoryResult<Vec<Task>> {
        self.store
            .select_tasks(filter)
            .await?
            .into_iter()
            .map(record_to_task)
            .collect()
    }

    /// Merges `patch` onto the stored task and writes the result.
    ///
    /// The merged task is validated as a whole before anything is written.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when the task does not exist,
    /// [`RepositoryError::Validation`] when the merge is invalid, or
    /// [`RepositoryError::Storage`] on store failure.
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> RepositoryResult<Task> {
        let current = self.get(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }
        let merged = current.apply_patch(patch, &*self.clock)?;
        self.write(&merged).await?;
        Ok(merged)
    }

    /// Sets the task status.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::update`].
    pub async fn update_status(&self, id: TaskId, status: TaskStatus) -> RepositoryResult<Task> {
        self.update(id, TaskPatch::new().with_status(status)).await
    }

    /// Writes a previously read task back verbatim, timestamps included.
    ///
    /// Used to undo a write whose dependent step failed.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when the row has since been
    /// deleted, or [`RepositoryError::Storage`] on store failure.
    pub async fn restore(&self, snapshot: &Task) -> RepositoryResult<()> {
        self.write(snapshot).await
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no row matches, or
    /// [`RepositoryError::Storage`] when child rows still reference it.
    pub async fn delete(&self, id: TaskId) -> RepositoryResult<()> {
        if self.store.delete_task(id).await? {
            Ok(())
        } else {
            Err(RepositoryError::task_not_found(id.into_inner()))
        }
    }

    async fn write(&self, task: &Task) -> RepositoryResult<()> {
        if self.store.update_task(&task_to_record(task)).await? {
            Ok(())
        } else {
            Err(RepositoryError::task_not_found(task.id().into_inner()))
        }
    }
}

fn task_to_record(task: &Task) -> TaskRecord {
    TaskRecord {
        id: task.id().into_inner(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        priority: i32::from(task.priority().value()),
        complexity: i32::from(task.complexity().value()),
        status: task.status().as_str().to_owned(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn record_to_task(record: TaskRecord) -> RepositoryResult<Task> {
    let TaskRecord {
        id,
        title,
        description,
        priority,
        complexity,
        status,
        created_at,
        updated_at,
    } = record;
    let corrupt =
        |err: TaskDomainError| RepositoryError::corrupt(TASK_ENTITY, id, err.to_string());

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        title: TaskTitle::new(title).map_err(corrupt)?,
        description,
        priority: Priority::new(i64::from(priority)).map_err(corrupt)?,
        complexity: Complexity::new(i64::from(complexity)).map_err(corrupt)?,
        status: TaskStatus::try_from(status.as_str())
            .map_err(|err| RepositoryError::corrupt(TASK_ENTITY, id, err.to_string()))?,
        created_at,
        updated_at,
    };
    Task::from_persisted(data).map_err(corrupt)
}
