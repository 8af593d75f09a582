//! `GitBranchService` behaviour against a real working copy.

use super::helpers::{TestRepository, repository};
use rstest::rstest;
use std::fs;
use tasktrace::config::RepositoryConfig;
use tasktrace::task::{
    adapters::git::GitBranchService,
    domain::{BranchName, TaskId},
    ports::{BranchService, BranchServiceError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_branch_checks_out_task_branch(repository: TestRepository) -> eyre::Result<()> {
    let task_id = TaskId::new();

    let branch = repository.service.create_branch(task_id).await?;

    assert_eq!(branch, BranchName::for_task(task_id));
    assert_eq!(repository.service.current_branch().await?, branch);
    assert!(repository.service.branch_exists(&branch).await?);
    let head = repository.service.head_commit().await?;
    let expected = repository.git(&["rev-parse", "main"])?;
    assert_eq!(head.map(|commit| commit.as_str().to_owned()), Some(expected));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_branch_rejects_existing_branch(repository: TestRepository) -> eyre::Result<()> {
    let task_id = TaskId::new();
    repository.service.create_branch(task_id).await?;
    repository.git(&["checkout", "--quiet", "main"])?;

    let result = repository.service.create_branch(task_id).await;

    assert!(matches!(result, Err(BranchServiceError::BranchExists(_))));
    assert_eq!(repository.service.current_branch().await?, BranchName::main());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_branch_rejects_dirty_working_copy(repository: TestRepository) -> eyre::Result<()> {
    fs::write(repository.path().join("scratch.txt"), "pending\n")?;

    let result = repository.service.create_branch(TaskId::new()).await;

    assert!(matches!(
        result,
        Err(BranchServiceError::DirtyWorkingCopy { changed: 1 })
    ));
    let status = repository.service.status().await?;
    assert_eq!(status.branch, BranchName::main());
    assert_eq!(status.changed_paths, vec!["scratch.txt".to_owned()]);
    Ok(())
}

#[rstest]
#[case("a")]
#[case("README.md")]
#[tokio::test(flavor = "multi_thread")]
async fn modified_tracked_file_blocks_branch_creation(
    repository: TestRepository,
    #[case] path: &str,
) -> eyre::Result<()> {
    repository.commit_file(path, "before\n", "Track file")?;
    fs::write(repository.path().join(path), "after\n")?;

    let result = repository.service.create_branch(TaskId::new()).await;

    assert!(matches!(
        result,
        Err(BranchServiceError::DirtyWorkingCopy { changed: 1 })
    ));
    let status = repository.service.status().await?;
    assert_eq!(status.branch, BranchName::main());
    assert_eq!(status.changed_paths, vec![path.to_owned()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn complete_task_merges_and_deletes_branch(repository: TestRepository) -> eyre::Result<()> {
    let task_id = TaskId::new();
    let branch = repository.service.create_branch(task_id).await?;
    repository.commit_file("feature.txt", "done\n", "Add feature")?;

    repository.service.complete_task(task_id).await?;

    assert_eq!(repository.service.current_branch().await?, BranchName::main());
    assert!(!repository.service.branch_exists(&branch).await?);
    assert!(repository.path().join("feature.txt").exists());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn locked_task_branch_does_not_fail_a_completed_merge(
    repository: TestRepository,
) -> eyre::Result<()> {
    let task_id = TaskId::new();
    let branch = repository.service.create_branch(task_id).await?;
    repository.commit_file("feature.txt", "done\n", "Add feature")?;
    let lock = repository
        .path()
        .join(".git/refs/heads")
        .join(format!("{branch}.lock"));
    fs::write(&lock, "")?;

    let result = repository.service.complete_task(task_id).await;
    fs::remove_file(&lock)?;

    result?;
    assert_eq!(repository.service.current_branch().await?, BranchName::main());
    assert!(repository.path().join("feature.txt").exists());
    assert!(repository.service.branch_exists(&branch).await?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn conflicting_merge_is_aborted_on_default_branch(
    repository: TestRepository,
) -> eyre::Result<()> {
    let task_id = TaskId::new();
    let branch = repository.service.create_branch(task_id).await?;
    repository.commit_file("README.md", "task side\n", "Task edit")?;
    repository.git(&["checkout", "--quiet", "main"])?;
    repository.commit_file("README.md", "main side\n", "Main edit")?;
    repository.git(&["checkout", "--quiet", branch.as_str()])?;

    let result = repository.service.complete_task(task_id).await;

    assert!(matches!(result, Err(BranchServiceError::MergeFailed { .. })));
    assert_eq!(repository.service.current_branch().await?, BranchName::main());
    assert!(repository.service.status().await?.is_clean());
    assert!(repository.git(&["rev-parse", "--verify", "--quiet", "MERGE_HEAD"]).is_err());
    assert!(repository.service.branch_exists(&branch).await?);
    assert_eq!(fs::read_to_string(repository.path().join("README.md"))?, "main side\n");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn complete_task_without_branch_is_not_found(
    repository: TestRepository,
) -> eyre::Result<()> {
    let result = repository.service.complete_task(TaskId::new()).await;

    assert!(matches!(result, Err(BranchServiceError::BranchNotFound(_))));
    assert_eq!(repository.service.current_branch().await?, BranchName::main());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cleanup_branch_discards_unmerged_history(repository: TestRepository) -> eyre::Result<()> {
    let branch = repository.service.create_branch(TaskId::new()).await?;
    repository.commit_file("draft.txt", "draft\n", "Unmerged work")?;

    repository.service.cleanup_branch(&branch).await?;

    assert!(!repository.service.branch_exists(&branch).await?);
    assert_eq!(repository.service.current_branch().await?, BranchName::main());
    assert!(!repository.path().join("draft.txt").exists());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cleanup_branch_refuses_default_branch(repository: TestRepository) -> eyre::Result<()> {
    let result = repository.service.cleanup_branch(&BranchName::main()).await;

    assert!(matches!(result, Err(BranchServiceError::Rejected { .. })));
    assert!(repository.service.branch_exists(&BranchName::main()).await?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_git_binary_is_a_runtime_error(repository: TestRepository) -> eyre::Result<()> {
    let config = RepositoryConfig {
        git_binary: "tasktrace-no-such-git".to_owned(),
        ..RepositoryConfig::for_path(repository.path())
    };
    let service = GitBranchService::from_config(&config)?;

    let result = service.current_branch().await;

    assert!(matches!(result, Err(BranchServiceError::Runtime(_))));
    Ok(())
}
