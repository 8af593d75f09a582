//! Given steps for task branch lifecycle BDD scenarios.

use super::world::{TaskBranchWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tasktrace::task::{
    domain::TaskStatus,
    ports::{BranchOperation, BranchService},
    services::CreateTaskRequest,
};

#[given("a clean working copy on the default branch")]
fn clean_working_copy(world: &TaskBranchWorld) -> Result<(), eyre::Report> {
    let status = run_async(world.branches.status()).wrap_err("read working copy status")?;
    eyre::ensure!(status.is_clean(), "working copy has pending changes");
    eyre::ensure!(
        status.branch == *world.branches.default_branch(),
        "expected the default branch, found {}",
        status.branch
    );
    Ok(())
}

#[given(r#"a task "{title}" has been created"#)]
fn task_has_been_created(world: &mut TaskBranchWorld, title: String) -> Result<(), eyre::Report> {
    let created = run_async(
        world
            .service
            .create_task(CreateTaskRequest::new(title, 3, 3)),
    )
    .wrap_err("create task for scenario setup")?;
    world.created = Some(created);
    Ok(())
}

#[given(r#"the task status has been set to "{status}""#)]
fn task_status_has_been_set(
    world: &mut TaskBranchWorld,
    status: String,
) -> Result<(), eyre::Report> {
    let target = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let task_id = world.created()?.task.id();
    run_async(world.service.update_task_status(task_id, target))
        .wrap_err("set task status for scenario setup")?;
    Ok(())
}

#[given("merging task branches fails")]
fn merging_fails(world: &TaskBranchWorld) -> Result<(), eyre::Report> {
    world
        .branches
        .fail_on(BranchOperation::CompleteTask, "simulated merge conflict")
        .wrap_err("inject merge failure")?;
    Ok(())
}
