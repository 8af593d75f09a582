//! `PostgreSQL` store implementation for tasks and their child rows.

use super::{
    models::{
        CodeLocationChangeset, CodeLocationRow, ImplementationChangeset, ImplementationRow,
        NewCodeLocationRow, NewImplementationRow, NewTaskRow, TaskChangeset, TaskRow,
    },
    schema::{code_locations, implementations, tasks},
};
use crate::config::DatabaseConfig;
use crate::task::{
    domain::{CodeLocationId, ImplementationId, TaskId},
    ports::{
        CodeLocationRecord, CodeLocationStore, ImplementationRecord, ImplementationStore,
        StoreError, StoreResult, TaskFilter, TaskRecord, TaskStore,
    },
};
use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Idempotent DDL for the `tasks`, `code_locations`, and `implementations`
/// tables.
pub const TASK_SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-10-15-000000_create_task_tables/up.sql");

/// `PostgreSQL`-backed store for all three task tables.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: TaskPgPool,
}

impl PostgresStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    /// Builds a connection pool from configuration.
    ///
    /// Blocks while the pool establishes its initial connections.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the database cannot be
    /// reached.
    pub fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(config.url.as_str());
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .build(manager)
            .map_err(StoreError::unavailable)?;
        Ok(Self::new(pool))
    }

    /// Creates the task tables when they do not already exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the DDL cannot be applied.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        self.run_blocking(|connection| {
            connection
                .batch_execute(TASK_SCHEMA_SQL)
                .map_err(StoreError::persistence)
        })
        .await
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::unavailable)?;
            f(&mut connection)
        })
        .await
        .map_err(StoreError::persistence)?
    }
}

/// Maps insert and update failures on a child table.
fn map_child_write_error(
    err: DieselError,
    table: &'static str,
    id: Uuid,
    task_id: Uuid,
) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::DuplicateKey { table, id }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            StoreError::ForeignKeyViolation { table, task_id }
        }
        other => StoreError::persistence(other),
    }
}

/// Escapes `LIKE` wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

#[async_trait]
impl TaskStore for PostgresStore {
    async fn insert_task(&self, record: &TaskRecord) -> StoreResult<()> {
        let id = record.id;
        let new_row = NewTaskRow::from(record);
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        StoreError::DuplicateKey { table: "tasks", id }
                    }
                    other => StoreError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn select_task(&self, id: TaskId) -> StoreResult<Option<TaskRecord>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(StoreError::persistence)?;
            Ok(row.map(TaskRecord::from))
        })
        .await
    }

    async fn select_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<TaskRecord>> {
        let predicate = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = tasks::table.select(TaskRow::as_select()).into_boxed();
            if let Some(status) = predicate.status {
                query = query.filter(tasks::status.eq(status.as_str()));
            }
            if let Some(priority) = predicate.min_priority {
                query = query.filter(tasks::priority.ge(i32::from(priority.value())));
            }
            if let Some(complexity) = predicate.max_complexity {
                query = query.filter(tasks::complexity.le(i32::from(complexity.value())));
            }
            if let Some(needle) = predicate.title_contains.as_deref() {
                query = query.filter(tasks::title.ilike(format!("%{}%", escape_like(needle))));
            }

            let rows = query
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .load::<TaskRow>(connection)
                .map_err(StoreError::persistence)?;
            Ok(rows.into_iter().map(TaskRecord::from).collect())
        })
        .await
    }

    async fn update_task(&self, record: &TaskRecord) -> StoreResult<bool> {
        let id = record.id;
        let changeset = TaskChangeset::from(record);
        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table.find(id))
                .set(&changeset)
                .execute(connection)
                .map_err(StoreError::persistence)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<bool> {
        let task_id = id.into_inner();
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(tasks::table.find(task_id))
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        StoreError::StillReferenced(task_id)
                    }
                    other => StoreError::persistence(other),
                })?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl CodeLocationStore for PostgresStore {
    async fn insert_code_location(&self, record: &CodeLocationRecord) -> StoreResult<()> {
        let (id, task_id) = (record.id, record.task_id);
        let new_row = NewCodeLocationRow::from(record);
        self.run_blocking(move |connection| {
            diesel::insert_into(code_locations::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| map_child_write_error(err, "code_locations", id, task_id))?;
            Ok(())
        })
        .await
    }

    async fn select_code_location(
        &self,
        id: CodeLocationId,
    ) -> StoreResult<Option<CodeLocationRecord>> {
        self.run_blocking(move |connection| {
            let row = code_locations::table
                .find(id.into_inner())
                .select(CodeLocationRow::as_select())
                .first::<CodeLocationRow>(connection)
                .optional()
                .map_err(StoreError::persistence)?;
            Ok(row.map(CodeLocationRecord::from))
        })
        .await
    }

    async fn select_code_locations_by_task(
        &self,
        task_id: TaskId,
    ) -> StoreResult<Vec<CodeLocationRecord>> {
        self.run_blocking(move |connection| {
            let rows = code_locations::table
                .filter(code_locations::task_id.eq(task_id.into_inner()))
                .order((code_locations::created_at.asc(), code_locations::id.asc()))
                .select(CodeLocationRow::as_select())
                .load::<CodeLocationRow>(connection)
                .map_err(StoreError::persistence)?;
            Ok(rows.into_iter().map(CodeLocationRecord::from).collect())
        })
        .await
    }

    async fn update_code_location(&self, record: &CodeLocationRecord) -> StoreResult<bool> {
        let (id, task_id) = (record.id, record.task_id);
        let changeset = CodeLocationChangeset::from(record);
        self.run_blocking(move |connection| {
            let updated = diesel::update(code_locations::table.find(id))
                .set(&changeset)
                .execute(connection)
                .map_err(|err| map_child_write_error(err, "code_locations", id, task_id))?;
            Ok(updated > 0)
        })
        .await
    }

    async fn delete_code_location(&self, id: CodeLocationId) -> StoreResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(code_locations::table.find(id.into_inner()))
                .execute(connection)
                .map_err(StoreError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl ImplementationStore for PostgresStore {
    async fn insert_implementation(&self, record: &ImplementationRecord) -> StoreResult<()> {
        let (id, task_id) = (record.id, record.task_id);
        let new_row = NewImplementationRow::from(record);
        self.run_blocking(move |connection| {
            diesel::insert_into(implementations::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| map_child_write_error(err, "implementations", id, task_id))?;
            Ok(())
        })
        .await
    }

    async fn select_implementation(
        &self,
        id: ImplementationId,
    ) -> StoreResult<Option<ImplementationRecord>> {
        self.run_blocking(move |connection| {
            let row = implementations::table
                .find(id.into_inner())
                .select(ImplementationRow::as_select())
                .first::<ImplementationRow>(connection)
                .optional()
                .map_err(StoreError::persistence)?;
            Ok(row.map(ImplementationRecord::from))
        })
        .await
    }

    async fn select_implementations_by_task(
        &self,
        task_id: TaskId,
    ) -> StoreResult<Vec<ImplementationRecord>> {
        self.run_blocking(move |connection| {
            let rows = implementations::table
                .filter(implementations::task_id.eq(task_id.into_inner()))
                .order((implementations::created_at.asc(), implementations::id.asc()))
                .select(ImplementationRow::as_select())
                .load::<ImplementationRow>(connection)
                .map_err(StoreError::persistence)?;
            Ok(rows.into_iter().map(ImplementationRecord::from).collect())
        })
        .await
    }

    async fn update_implementation(&self, record: &ImplementationRecord) -> StoreResult<bool> {
        let id = record.id;
        let changeset = ImplementationChangeset::from(record);
        self.run_blocking(move |connection| {
            let updated = diesel::update(implementations::table.find(id))
                .set(&changeset)
                .execute(connection)
                .map_err(StoreError::persistence)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn delete_implementation(&self, id: ImplementationId) -> StoreResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(implementations::table.find(id.into_inner()))
                .execute(connection)
                .map_err(StoreError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }
}
