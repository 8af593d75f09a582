//! Lifecycle orchestration against a real working copy.

use super::helpers::{TestRepository, init_repository};
use std::sync::Arc;
use tasktrace::task::{
    adapters::{git::GitBranchService, memory::InMemoryStore},
    domain::{BranchName, TaskStatus},
    ports::BranchService,
    services::{
        AddCodeLocationRequest, CreateTaskRequest, ErrorKind, InitialCodeLocation,
        TaskLifecycleService,
    },
};
use mockable::DefaultClock;

type GitService = TaskLifecycleService<InMemoryStore, GitBranchService, DefaultClock>;

fn lifecycle() -> eyre::Result<(tempfile::TempDir, Arc<GitBranchService>, GitService)> {
    let TestRepository { dir, service } = init_repository()?;
    let branches = Arc::new(service);
    let lifecycle = TaskLifecycleService::new(
        Arc::new(InMemoryStore::new()),
        Arc::clone(&branches),
        Arc::new(DefaultClock),
    );
    Ok((dir, branches, lifecycle))
}

#[tokio::test(flavor = "multi_thread")]
async fn task_round_trip_through_git() -> eyre::Result<()> {
    let (dir, branches, service) = lifecycle()?;

    let created = service
        .create_task(
            CreateTaskRequest::new("Git-backed task", 3, 4)
                .with_initial_location(InitialCodeLocation::new("src/x.ts", 1).with_end_line(10)),
        )
        .await?;
    let head = branches.head_commit().await?;
    let initial = created
        .code_location
        .ok_or_else(|| eyre::eyre!("initial location missing"))?;
    assert_eq!(initial.branch_name(), Some(&created.branch));
    assert_eq!(initial.commit_ref(), head.as_ref());

    std::fs::write(dir.path().join("x.ts"), "export {};\n")?;
    super::helpers::run_git(dir.path(), &["add", "x.ts"])?;
    super::helpers::run_git(dir.path(), &["commit", "--quiet", "-m", "Task work"])?;
    let later = service
        .add_code_location(AddCodeLocationRequest::new(created.task.id(), "x.ts", 1))
        .await?;
    assert_ne!(later.commit_ref(), initial.commit_ref());

    let completed = service.complete_task(created.task.id()).await?;
    assert_eq!(completed.status(), TaskStatus::Completed);
    assert_eq!(branches.current_branch().await?, BranchName::main());
    assert!(!branches.branch_exists(&created.branch).await?);
    assert!(dir.path().join("x.ts").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_merge_leaves_task_status_unchanged() -> eyre::Result<()> {
    let (dir, branches, service) = lifecycle()?;
    let created = service
        .create_task(CreateTaskRequest::new("Conflicting task", 2, 2))
        .await?;
    super::helpers::run_git(dir.path(), &["checkout", "--quiet", "main"])?;
    // Deleting the task branch out from under the service makes the merge fail.
    super::helpers::run_git(dir.path(), &["branch", "-D", created.branch.as_str()])?;

    let result = service.complete_task(created.task.id()).await;

    let err = result.err().ok_or_else(|| eyre::eyre!("completion should fail"))?;
    assert_eq!(err.kind(), ErrorKind::VersionControl);
    let stored = service
        .find_task(created.task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task missing"))?;
    assert_eq!(stored, created.task);
    assert_eq!(branches.current_branch().await?, BranchName::main());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn undeletable_task_branch_keeps_task_completed() -> eyre::Result<()> {
    let (dir, branches, service) = lifecycle()?;
    let created = service
        .create_task(CreateTaskRequest::new("Merged but kept", 2, 2))
        .await?;
    std::fs::write(dir.path().join("work.txt"), "done\n")?;
    super::helpers::run_git(dir.path(), &["add", "work.txt"])?;
    super::helpers::run_git(dir.path(), &["commit", "--quiet", "-m", "Task work"])?;
    let lock = dir
        .path()
        .join(".git/refs/heads")
        .join(format!("{}.lock", created.branch));
    std::fs::write(&lock, "")?;

    let result = service.complete_task(created.task.id()).await;
    std::fs::remove_file(&lock)?;

    assert_eq!(result?.status(), TaskStatus::Completed);
    let stored = service
        .find_task(created.task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task missing"))?;
    assert_eq!(stored.status(), TaskStatus::Completed);
    assert_eq!(branches.current_branch().await?, BranchName::main());
    assert!(dir.path().join("work.txt").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn dirty_working_copy_blocks_task_branch() -> eyre::Result<()> {
    let (dir, branches, service) = lifecycle()?;
    std::fs::write(dir.path().join("pending.txt"), "uncommitted\n")?;

    let result = service
        .create_task(CreateTaskRequest::new("Blocked", 1, 1))
        .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("creation should fail"))?;
    assert_eq!(err.kind(), ErrorKind::VersionControl);
    assert_eq!(branches.current_branch().await?, BranchName::main());
    Ok(())
}
