//! Concurrent orchestrator calls sharing one working copy.

use std::sync::Arc;

use tasktrace::task::{
    adapters::memory::{InMemoryBranchService, InMemoryStore},
    domain::{BranchName, TaskStatus},
    ports::{BranchService, TaskFilter},
    services::{CreateTaskRequest, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type SharedService = Arc<TaskLifecycleService<InMemoryStore, InMemoryBranchService, DefaultClock>>;

struct Harness {
    service: SharedService,
    branches: Arc<InMemoryBranchService>,
}

#[fixture]
fn harness() -> Harness {
    let branches = Arc::new(InMemoryBranchService::new());
    Harness {
        service: Arc::new(TaskLifecycleService::new(
            Arc::new(InMemoryStore::new()),
            Arc::clone(&branches),
            Arc::new(DefaultClock),
        )),
        branches,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creations_each_get_a_branch(harness: Harness) -> eyre::Result<()> {
    let handles: Vec<_> = (0..16)
        .map(|index| {
            let service = Arc::clone(&harness.service);
            tokio::spawn(async move {
                service
                    .create_task(CreateTaskRequest::new(format!("Concurrent {index}"), 3, 3))
                    .await
            })
        })
        .collect();

    let mut created = Vec::with_capacity(handles.len());
    for handle in handles {
        created.push(handle.await??);
    }

    let branches = harness.branches.branches()?;
    assert_eq!(branches.len(), created.len() + 1);
    for task in &created {
        assert!(branches.contains(&task.branch));
        assert_eq!(task.branch, BranchName::for_task(task.task.id()));
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_leave_default_branch_checked_out(
    harness: Harness,
) -> eyre::Result<()> {
    let mut ids = Vec::new();
    for index in 0..8 {
        let created = harness
            .service
            .create_task(CreateTaskRequest::new(format!("Finish {index}"), 2, 2))
            .await?;
        ids.push(created.task.id());
    }

    let handles: Vec<_> = ids
        .iter()
        .map(|&task_id| {
            let service = Arc::clone(&harness.service);
            tokio::spawn(async move { service.complete_task(task_id).await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    assert_eq!(harness.branches.current_branch().await?, BranchName::main());
    assert_eq!(harness.branches.branches()?, vec![BranchName::main()]);
    let completed = harness
        .service
        .list_tasks(&TaskFilter::new().with_status(TaskStatus::Completed))
        .await?;
    assert_eq!(completed.len(), ids.len());
    Ok(())
}
