//! Validated repository for implementation rows.

use super::error::{
    IMPLEMENTATION_ENTITY, RepositoryError, RepositoryResult, map_child_store_error,
};
use crate::task::{
    domain::{
        Implementation, ImplementationId, ImplementationPatch, NewImplementation, PatternType,
        PersistedImplementationData, SuccessRating, TaskDomainError, TaskId,
    },
    ports::{ImplementationRecord, ImplementationStore, TaskStore},
};
use mockable::Clock;
use std::sync::Arc;

/// Implementation repository over a store holding both tasks and
/// implementations.
#[derive(Clone)]
pub struct ImplementationRepository<S, C>
where
    S: TaskStore + ImplementationStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> ImplementationRepository<S, C>
where
    S: TaskStore + ImplementationStore,
    C: Clock + Send + Sync,
{
    /// Creates a repository over `store` stamping times from `clock`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Validates and inserts a new implementation record.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Validation`] for invalid fields,
    /// [`RepositoryError::NotFound`] when the owning task does not exist, or
    /// [`RepositoryError::Storage`] when the insert fails.
    pub async fn create(&self, fields: NewImplementation) -> RepositoryResult<Implementation> {
        let task_id = fields.task_id();
        let implementation = Implementation::create(fields, &*self.clock)?;
        if self.store.select_task(task_id).await?.is_none() {
            return Err(RepositoryError::task_not_found(task_id.into_inner()));
        }
        self.store
            .insert_implementation(&implementation_to_record(&implementation))
            .await
            .map_err(map_child_store_error)?;
        Ok(implementation)
    }

    /// Looks up an implementation record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::CorruptData`] when the stored row fails
    /// validation, or [`RepositoryError::Storage`] on store failure.
    pub async fn find_by_id(
        &self,
        id: ImplementationId,
    ) -> RepositoryResult<Option<Implementation>> {
        self.store
            .select_implementation(id)
            .await?
            .map(record_to_implementation)
            .transpose()
    }

    /// Lists every implementation record owned by a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::CorruptData`] when any row fails
    /// validation, or [`RepositoryError::Storage`] on store failure.
    pub async fn find_by_task_id(&self, task_id: TaskId) -> RepositoryResult<Vec<Implementation>> {
        self.store
            .select_implementations_by_task(task_id)
            .await?
            .into_iter()
            .map(record_to_implementation)
            .collect()
    }

    /// Merges `patch` onto the stored record and writes the result.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when the record does not exist,
    /// [`RepositoryError::Validation`] when the merge is invalid, or
    /// [`RepositoryError::Storage`] on store failure.
    pub async fn update(
        &self,
        id: ImplementationId,
        patch: ImplementationPatch,
    ) -> RepositoryResult<Implementation> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        let merged = current.apply_patch(patch)?;
        if !self
            .store
            .update_implementation(&implementation_to_record(&merged))
            .await?
        {
            return Err(not_found(id));
        }
        Ok(merged)
    }

    /// Deletes an implementation record.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no row matches, or
    /// [`RepositoryError::Storage`] on store failure.
    pub async fn delete(&self, id: ImplementationId) -> RepositoryResult<()> {
        if self.store.delete_implementation(id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }
}

const fn not_found(id: ImplementationId) -> RepositoryError {
    RepositoryError::NotFound {
        entity: IMPLEMENTATION_ENTITY,
        id: id.into_inner(),
    }
}

fn implementation_to_record(implementation: &Implementation) -> ImplementationRecord {
    ImplementationRecord {
        id: implementation.id().into_inner(),
        task_id: implementation.task_id().into_inner(),
        pattern_type: implementation.pattern_type().as_str().to_owned(),
        pattern_data: implementation.pattern_data().to_owned(),
        success_rating: implementation.success_rating().map(SuccessRating::value),
        created_at: implementation.created_at(),
    }
}

fn record_to_implementation(record: ImplementationRecord) -> RepositoryResult<Implementation> {
    let ImplementationRecord {
        id,
        task_id,
        pattern_type,
        pattern_data,
        success_rating,
        created_at,
    } = record;
    let corrupt = |err: TaskDomainError| {
        RepositoryError::corrupt(IMPLEMENTATION_ENTITY, id, err.to_string())
    };

    Ok(Implementation::from_persisted(PersistedImplementationData {
        id: ImplementationId::from_uuid(id),
        task_id: TaskId::from_uuid(task_id),
        pattern_type: PatternType::new(pattern_type).map_err(corrupt)?,
        pattern_data,
        success_rating: success_rating
            .map(SuccessRating::new)
            .transpose()
            .map_err(corrupt)?,
        created_at,
    }))
}
