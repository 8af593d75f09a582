//! Validated repository for code location rows.

use super::error::{
    CODE_LOCATION_ENTITY, RepositoryError, RepositoryResult, map_child_store_error,
};
use crate::task::{
    domain::{
        BranchName, CodeLocation, CodeLocationId, CodeLocationPatch, CommitRef, FilePath,
        LineNumber, NewCodeLocation, PersistedCodeLocationData, TaskDomainError, TaskId,
    },
    ports::{CodeLocationRecord, CodeLocationStore, TaskStore},
};
use mockable::Clock;
use std::sync::Arc;

/// Code location repository over a store holding both tasks and code
/// locations.
#[derive(Clone)]
pub struct CodeLocationRepository<S, C>
where
    S: TaskStore + CodeLocationStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> CodeLocationRepository<S, C>
where
    S: TaskStore + CodeLocationStore,
    C: Clock + Send + Sync,
{
    /// Creates a repository over `store` stamping times from `clock`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Validates and inserts a new code location.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Validation`] for invalid fields,
    /// [`RepositoryError::NotFound`] when the owning task does not exist, or
    /// [`RepositoryError::Storage`] when the insert fails.
    pub async fn create(&self, fields: NewCodeLocation) -> RepositoryResult<CodeLocation> {
        let task_id = fields.task_id();
        let location = CodeLocation::create(fields, &*self.clock)?;
        if self.store.select_task(task_id).await?.is_none() {
            return Err(RepositoryError::task_not_found(task_id.into_inner()));
        }
        self.store
            .insert_code_location(&location_to_record(&location))
            .await
            .map_err(map_child_store_error)?;
        Ok(location)
    }

    /// Looks up a code location by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::CorruptData`] when the stored row fails
    /// validation, or [`RepositoryError::Storage`] on store failure.
    pub async fn find_by_id(&self, id: CodeLocationId) -> RepositoryResult<Option<CodeLocation>> {
        self.store
            .select_code_location(id)
            .await?
            .map(record_to_location)
            .transpose()
    }

    /// Lists every code location owned by a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::CorruptData`] when any row fails
    /// validation, or [`RepositoryError::Storage`] on store failure.
    pub async fn find_by_task_id(&self, task_id: TaskId) -> RepositoryResult<Vec<CodeLocation>> {
        self.store
            .select_code_locations_by_task(task_id)
            .await?
            .into_iter()
            .map(record_to_location)
            .collect()
    }

    /// Merges `patch` onto the stored location and writes the result.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when the location does not
    /// exist, [`RepositoryError::Validation`] when the merge is invalid, or
    /// [`RepositoryError::Storage`] on store failure.
    pub async fn update(
        &self,
        id: CodeLocationId,
        patch: CodeLocationPatch,
    ) -> RepositoryResult<CodeLocation> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        let merged = current.apply_patch(patch)?;
        let updated = self
            .store
            .update_code_location(&location_to_record(&merged))
            .await
            .map_err(map_child_store_error)?;
        if !updated {
            return Err(not_found(id));
        }
        Ok(merged)
    }

    /// Deletes a code location.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no row matches, or
    /// [`RepositoryError::Storage`] on store failure.
    pub async fn delete(&self, id: CodeLocationId) -> RepositoryResult<()> {
        if self.store.delete_code_location(id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }
}

const fn not_found(id: CodeLocationId) -> RepositoryError {
    RepositoryError::NotFound {
        entity: CODE_LOCATION_ENTITY,
        id: id.into_inner(),
    }
}

fn location_to_record(location: &CodeLocation) -> CodeLocationRecord {
    CodeLocationRecord {
        id: location.id().into_inner(),
        task_id: location.task_id().into_inner(),
        file_path: location.file_path().as_str().to_owned(),
        start_line: line_to_column(location.start_line()),
        end_line: location.end_line().map(line_to_column),
        branch_name: location.branch_name().map(|branch| branch.as_str().to_owned()),
        commit_ref: location.commit_ref().map(|commit| commit.as_str().to_owned()),
        created_at: location.created_at(),
    }
}

/// Converts a validated line number to its column value.
///
/// [`LineNumber`] is bounded by `i32::MAX`, so saturation never triggers.
fn line_to_column(line: LineNumber) -> i32 {
    i32::try_from(line.value()).unwrap_or(i32::MAX)
}

fn record_to_location(record: CodeLocationRecord) -> RepositoryResult<CodeLocation> {
    let CodeLocationRecord {
        id,
        task_id,
        file_path,
        start_line,
        end_line,
        branch_name,
        commit_ref,
        created_at,
    } = record;
    let corrupt = |err: TaskDomainError| {
        RepositoryError::corrupt(CODE_LOCATION_ENTITY, id, err.to_string())
    };

    let data = PersistedCodeLocationData {
        id: CodeLocationId::from_uuid(id),
        task_id: TaskId::from_uuid(task_id),
        file_path: FilePath::new(file_path).map_err(corrupt)?,
        start_line: LineNumber::new(i64::from(start_line)).map_err(corrupt)?,
        end_line: end_line
            .map(|line| LineNumber::new(i64::from(line)))
            .transpose()
            .map_err(corrupt)?,
        branch_name: branch_name
            .map(BranchName::new)
            .transpose()
            .map_err(corrupt)?,
        commit_ref: commit_ref.map(CommitRef::new).transpose().map_err(corrupt)?,
        created_at,
    };
    CodeLocation::from_persisted(data).map_err(corrupt)
}
