//! Row-level behaviour of `PostgresStore` and the repositories over it.

use super::helpers::{TestDatabase, test_runtime};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use std::sync::Arc;
use tasktrace::task::{
    domain::{
        CodeLocationId, CodeLocationPatch, FieldUpdate, NewCodeLocation, NewImplementation,
        NewTask, TaskId, TaskPatch, TaskStatus,
    },
    ports::{CodeLocationStore, StoreError, TaskFilter, TaskStore},
    repository::{
        CodeLocationRepository, ImplementationRepository, RepositoryError, TaskRepository,
    },
};

#[rstest]
fn task_round_trips_with_patch(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let database = TestDatabase::from_template(shared_test_cluster)?;
    let tasks = TaskRepository::new(Arc::new(database.store()?), Arc::new(DefaultClock));

    test_runtime()?.block_on(async {
        let created = tasks
            .create(NewTask::new("Round trip", 4, 2).with_description("stored"))
            .await?;
        let fetched = tasks
            .find_by_id(created.id())
            .await?
            .ok_or_else(|| eyre::eyre!("task missing"))?;
        assert_eq!(fetched.title(), created.title());
        assert_eq!(fetched.priority(), created.priority());
        assert_eq!(fetched.description(), Some("stored"));
        assert_eq!(fetched.status(), TaskStatus::Created);

        let updated = tasks
            .update(
                created.id(),
                TaskPatch::new()
                    .with_status(TaskStatus::Paused)
                    .with_description(FieldUpdate::Clear),
            )
            .await?;
        let stored = tasks.get(created.id()).await?;
        assert_eq!(stored.status(), TaskStatus::Paused);
        assert_eq!(stored.description(), None);
        assert_eq!(stored.id(), updated.id());

        tasks.delete(created.id()).await?;
        assert_eq!(tasks.find_by_id(created.id()).await?, None);
        Ok::<(), eyre::Report>(())
    })
}

#[rstest]
fn title_filter_is_case_insensitive_and_escapes_wildcards(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::from_template(shared_test_cluster)?;
    let tasks = TaskRepository::new(Arc::new(database.store()?), Arc::new(DefaultClock));

    test_runtime()?.block_on(async {
        let literal = tasks.create(NewTask::new("100% done", 3, 3)).await?;
        tasks.create(NewTask::new("100 percent done", 3, 3)).await?;

        let filter = TaskFilter::new().with_title_containing("100% DONE");
        let matched = tasks.find_all(&filter).await?;

        let ids: Vec<TaskId> = matched.iter().map(|task| task.id()).collect();
        assert_eq!(ids, vec![literal.id()]);
        Ok::<(), eyre::Report>(())
    })
}

#[rstest]
fn child_row_for_missing_task_is_rejected(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::from_template(shared_test_cluster)?;
    let locations = CodeLocationRepository::new(Arc::new(database.store()?), Arc::new(DefaultClock));
    let missing = TaskId::new();

    let result = test_runtime()?.block_on(
        locations.create(NewCodeLocation::new(missing, "src/lib.rs", 1)),
    );

    assert!(matches!(
        result,
        Err(RepositoryError::NotFound { entity: "task", id }) if id == missing.into_inner()
    ));
    Ok(())
}

#[rstest]
fn task_with_children_cannot_be_deleted(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::from_template(shared_test_cluster)?;
    let shared = Arc::new(database.store()?);
    let clock = Arc::new(DefaultClock);
    let tasks = TaskRepository::new(Arc::clone(&shared), Arc::clone(&clock));
    let implementations = ImplementationRepository::new(Arc::clone(&shared), clock);

    test_runtime()?.block_on(async {
        let task = tasks.create(NewTask::new("Parent", 1, 1)).await?;
        let implementation = implementations
            .create(
                NewImplementation::new(task.id(), "refactoring", "{}").with_success_rating(0.95),
            )
            .await?;

        let result = tasks.delete(task.id()).await;

        assert!(matches!(
            result,
            Err(RepositoryError::Storage(StoreError::StillReferenced(_)))
        ));
        let listed = implementations.find_by_task_id(task.id()).await?;
        assert_eq!(listed.len(), 1);
        assert!(listed.iter().all(|row| row.id() == implementation.id()));
        implementations.delete(implementation.id()).await?;
        tasks.delete(task.id()).await?;
        Ok::<(), eyre::Report>(())
    })
}

#[rstest]
fn reversed_span_row_reads_back_as_corrupt(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::from_template(shared_test_cluster)?;
    let shared = Arc::new(database.store()?);
    let clock = Arc::new(DefaultClock);
    let tasks = TaskRepository::new(Arc::clone(&shared), Arc::clone(&clock));
    let locations = CodeLocationRepository::new(Arc::clone(&shared), clock);

    test_runtime()?.block_on(async {
        let task = tasks.create(NewTask::new("Drift", 1, 1)).await?;
        let location = locations
            .create(NewCodeLocation::new(task.id(), "src/lib.rs", 5).with_end_line(9))
            .await?;

        let mut record = shared
            .select_code_location(location.id())
            .await?
            .ok_or_else(|| eyre::eyre!("row missing"))?;
        record.end_line = Some(2);
        assert!(shared.update_code_location(&record).await?);

        let result = locations.find_by_id(location.id()).await;
        assert!(matches!(result, Err(RepositoryError::CorruptData { .. })));

        let repaired = locations
            .update(
                location.id(),
                CodeLocationPatch::new().with_end_line(FieldUpdate::Set(12)),
            )
            .await;
        assert!(repaired.is_err());
        assert!(shared.delete_code_location(location.id()).await?);
        assert!(!shared.delete_code_location(CodeLocationId::new()).await?);
        tasks.delete(task.id()).await?;
        Ok::<(), eyre::Report>(())
    })
}

#[rstest]
fn ensure_schema_is_idempotent(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let database = TestDatabase::from_template(shared_test_cluster)?;
    let store = database.store()?;

    test_runtime()?.block_on(async {
        store.ensure_schema().await?;
        store.ensure_schema().await?;
        let rows = store.select_tasks(&TaskFilter::new()).await?;
        assert!(rows.is_empty());
        Ok::<(), eyre::Report>(())
    })
}
