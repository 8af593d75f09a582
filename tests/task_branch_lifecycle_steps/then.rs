//! Then steps for task branch lifecycle BDD scenarios.

use super::world::{TaskBranchWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use tasktrace::task::{
    domain::{SuccessRating, TaskStatus},
    ports::BranchService,
    services::ErrorKind,
};

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskBranchWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task_id = world.created()?.task.id();
    let task = run_async(world.service.find_task(task_id))
        .wrap_err("look up task")?
        .ok_or_else(|| eyre::eyre!("task {task_id} missing"))?;

    eyre::ensure!(
        task.status() == expected,
        "expected status {expected}, found {}",
        task.status()
    );
    Ok(())
}

#[then(r#"the task has {count:usize} code location for "{path}" tagged with the task branch"#)]
fn task_has_tagged_locations(
    world: &TaskBranchWorld,
    count: usize,
    path: String,
) -> Result<(), eyre::Report> {
    let created = world.created()?;
    let details = run_async(world.service.get_task_with_details(created.task.id()))
        .wrap_err("load task details")?;

    eyre::ensure!(
        details.code_locations.len() == count,
        "expected {count} code locations, found {}",
        details.code_locations.len()
    );
    for location in &details.code_locations {
        eyre::ensure!(location.file_path().as_str() == path, "unexpected file path");
        eyre::ensure!(
            location.branch_name() == Some(&created.branch),
            "location not tagged with {}",
            created.branch
        );
    }
    Ok(())
}

#[then("the attribution fails with a version control error")]
fn attribution_fails(world: &TaskBranchWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_location_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing attribution result"))?;
    match result {
        Err(err) if err.kind() == ErrorKind::VersionControl => Ok(()),
        other => Err(eyre::eyre!("expected a version control error, got {other:?}")),
    }
}

#[then("the task has no code locations")]
fn task_has_no_locations(world: &TaskBranchWorld) -> Result<(), eyre::Report> {
    let task_id = world.created()?.task.id();
    let details = run_async(world.service.get_task_with_details(task_id))
        .wrap_err("load task details")?;
    eyre::ensure!(
        details.code_locations.is_empty(),
        "expected no code locations, found {}",
        details.code_locations.len()
    );
    Ok(())
}

#[then("the implementation has rating {rating:f64} and belongs to the task")]
fn implementation_matches(world: &TaskBranchWorld, rating: f64) -> Result<(), eyre::Report> {
    let task_id = world.created()?.task.id();
    let implementation = world
        .last_implementation
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing recorded implementation"))?;

    eyre::ensure!(implementation.task_id() == task_id, "task id mismatch");
    let recorded = implementation
        .success_rating()
        .map(SuccessRating::value)
        .ok_or_else(|| eyre::eyre!("implementation has no rating"))?;
    eyre::ensure!(
        recorded.to_bits() == rating.to_bits(),
        "expected rating {rating}, found {recorded}"
    );
    Ok(())
}

#[then("the completion fails with a version control error")]
fn completion_fails(world: &TaskBranchWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_completion_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing completion result"))?;
    match result {
        Err(err) if err.kind() == ErrorKind::VersionControl => Ok(()),
        other => Err(eyre::eyre!("expected a version control error, got {other:?}")),
    }
}

#[then("the working copy is on the default branch")]
fn on_default_branch(world: &TaskBranchWorld) -> Result<(), eyre::Report> {
    let current = run_async(world.branches.current_branch()).wrap_err("read current branch")?;
    eyre::ensure!(
        current == *world.branches.default_branch(),
        "expected the default branch, found {current}"
    );
    Ok(())
}

#[then("the task branch no longer exists")]
fn task_branch_removed(world: &TaskBranchWorld) -> Result<(), eyre::Report> {
    let branch = &world.created()?.branch;
    let exists = run_async(world.branches.branch_exists(branch)).wrap_err("check branch")?;
    eyre::ensure!(!exists, "branch {branch} still exists");
    Ok(())
}
