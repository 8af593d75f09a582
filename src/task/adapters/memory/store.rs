//! In-memory row store for repository and orchestrator tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::task::{
    domain::{CodeLocationId, ImplementationId, TaskId},
    ports::{
        CodeLocationRecord, CodeLocationStore, ImplementationRecord, ImplementationStore,
        StoreError, StoreResult, TaskFilter, TaskRecord, TaskStore,
    },
};

/// Thread-safe in-memory store for all three tables.
///
/// Mirrors the relational constraints of the `PostgreSQL` schema: child rows
/// must reference an existing task and a task cannot be deleted while child
/// rows still point at it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    tasks: HashMap<Uuid, TaskRecord>,
    code_locations: HashMap<Uuid, CodeLocationRecord>,
    implementations: HashMap<Uuid, ImplementationRecord>,
}

impl InMemoryStoreState {
    fn task_is_referenced(&self, task_id: Uuid) -> bool {
        self.code_locations
            .values()
            .any(|location| location.task_id == task_id)
            || self
                .implementations
                .values()
                .any(|implementation| implementation.task_id == task_id)
    }
}

impl InMemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a task row without any checks.
    ///
    /// Lets tests plant rows that violate domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the lock is poisoned.
    pub fn put_raw_task(&self, record: TaskRecord) -> StoreResult<()> {
        self.write()?.tasks.insert(record.id, record);
        Ok(())
    }

    /// Overwrites a code location row without any checks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the lock is poisoned.
    pub fn put_raw_code_location(&self, record: CodeLocationRecord) -> StoreResult<()> {
        self.write()?.code_locations.insert(record.id, record);
        Ok(())
    }

    /// Overwrites an implementation row without any checks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the lock is poisoned.
    pub fn put_raw_implementation(&self, record: ImplementationRecord) -> StoreResult<()> {
        self.write()?.implementations.insert(record.id, record);
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, InMemoryStoreState>> {
        self.state
            .read()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, InMemoryStoreState>> {
        self.state
            .write()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert_task(&self, record: &TaskRecord) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&record.id) {
            return Err(StoreError::DuplicateKey {
                table: "tasks",
                id: record.id,
            });
        }
        state.tasks.insert(record.id, record.clone());
        Ok(())
    }

    async fn select_task(&self, id: TaskId) -> StoreResult<Option<TaskRecord>> {
        Ok(self.read()?.tasks.get(id.as_ref()).cloned())
    }

    async fn select_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<TaskRecord>> {
        let state = self.read()?;
        let mut rows: Vec<TaskRecord> = state
            .tasks
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn update_task(&self, record: &TaskRecord) -> StoreResult<bool> {
        let mut state = self.write()?;
        let Some(stored) = state.tasks.get_mut(&record.id) else {
            return Ok(false);
        };
        *stored = record.clone();
        Ok(true)
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<bool> {
        let mut state = self.write()?;
        let task_id = id.into_inner();
        if !state.tasks.contains_key(&task_id) {
            return Ok(false);
        }
        if state.task_is_referenced(task_id) {
            return Err(StoreError::StillReferenced(task_id));
        }
        state.tasks.remove(&task_id);
        Ok(true)
    }
}

#[async_trait]
impl CodeLocationStore for InMemoryStore {
    async fn insert_code_location(&self, record: &CodeLocationRecord) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&record.task_id) {
            return Err(StoreError::ForeignKeyViolation {
                table: "code_locations",
                task_id: record.task_id,
            });
        }
        if state.code_locations.contains_key(&record.id) {
            return Err(StoreError::DuplicateKey {
                table: "code_locations",
                id: record.id,
            });
        }
        state.code_locations.insert(record.id, record.clone());
        Ok(())
    }

    async fn select_code_location(
        &self,
        id: CodeLocationId,
    ) -> StoreResult<Option<CodeLocationRecord>> {
        Ok(self.read()?.code_locations.get(id.as_ref()).cloned())
    }

    async fn select_code_locations_by_task(
        &self,
        task_id: TaskId,
    ) -> StoreResult<Vec<CodeLocationRecord>> {
        let state = self.read()?;
        let mut rows: Vec<CodeLocationRecord> = state
            .code_locations
            .values()
            .filter(|record| record.task_id == task_id.into_inner())
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn update_code_location(&self, record: &CodeLocationRecord) -> StoreResult<bool> {
        let mut state = self.write()?;
        if !state.code_locations.contains_key(&record.id) {
            return Ok(false);
        }
        if !state.tasks.contains_key(&record.task_id) {
            return Err(StoreError::ForeignKeyViolation {
                table: "code_locations",
                task_id: record.task_id,
            });
        }
        state.code_locations.insert(record.id, record.clone());
        Ok(true)
    }

    async fn delete_code_location(&self, id: CodeLocationId) -> StoreResult<bool> {
        Ok(self.write()?.code_locations.remove(id.as_ref()).is_some())
    }
}

#[async_trait]
impl ImplementationStore for InMemoryStore {
    async fn insert_implementation(&self, record: &ImplementationRecord) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&record.task_id) {
            return Err(StoreError::ForeignKeyViolation {
                table: "implementations",
                task_id: record.task_id,
            });
        }
        if state.implementations.contains_key(&record.id) {
            return Err(StoreError::DuplicateKey {
                table: "implementations",
                id: record.id,
            });
        }
        state.implementations.insert(record.id, record.clone());
        Ok(())
    }

    async fn select_implementation(
        &self,
        id: ImplementationId,
    ) -> StoreResult<Option<ImplementationRecord>> {
        Ok(self.read()?.implementations.get(id.as_ref()).cloned())
    }

    async fn select_implementations_by_task(
        &self,
        task_id: TaskId,
    ) -> StoreResult<Vec<ImplementationRecord>> {
        let state = self.read()?;
        let mut rows: Vec<ImplementationRecord> = state
            .implementations
            .values()
            .filter(|record| record.task_id == task_id.into_inner())
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn update_implementation(&self, record: &ImplementationRecord) -> StoreResult<bool> {
        let mut state = self.write()?;
        let Some(stored) = state.implementations.get_mut(&record.id) else {
            return Ok(false);
        };
        *stored = record.clone();
        Ok(true)
    }

    async fn delete_implementation(&self, id: ImplementationId) -> StoreResult<bool> {
        Ok(self.write()?.implementations.remove(id.as_ref()).is_some())
    }
}
