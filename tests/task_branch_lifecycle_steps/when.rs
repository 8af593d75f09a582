//! When steps for task branch lifecycle BDD scenarios.

use super::world::{TaskBranchWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use tasktrace::task::{
    ports::BranchService,
    services::{
        AddCodeLocationRequest, CreateTaskRequest, InitialCodeLocation,
        RecordImplementationRequest,
    },
};

#[when(
    r#"a task "{title}" is created with priority {priority:i64} and complexity {complexity:i64} covering "{path}" lines {start:i64} to {end:i64}"#
)]
fn task_is_created_with_location(
    world: &mut TaskBranchWorld,
    title: String,
    priority: i64,
    complexity: i64,
    path: String,
    start: i64,
    end: i64,
) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(title, priority, complexity)
        .with_initial_location(InitialCodeLocation::new(path, start).with_end_line(end));
    let created = run_async(world.service.create_task(request)).wrap_err("create task")?;
    world.created = Some(created);
    Ok(())
}

#[when("the working copy switches to the default branch")]
fn switch_to_default_branch(world: &TaskBranchWorld) -> Result<(), eyre::Report> {
    let default_branch = world.branches.default_branch().clone();
    world
        .branches
        .checkout(&default_branch)
        .wrap_err("check out default branch")?;
    Ok(())
}

#[when(r#"code at "{path}" line {line:i64} is attributed to the task"#)]
fn code_is_attributed(
    world: &mut TaskBranchWorld,
    path: String,
    line: i64,
) -> Result<(), eyre::Report> {
    let task_id = world.created()?.task.id();
    let result = run_async(
        world
            .service
            .add_code_location(AddCodeLocationRequest::new(task_id, path, line)),
    );
    world.last_location_result = Some(result);
    Ok(())
}

#[when(
    r#"an implementation of type "{pattern_type}" with data "{pattern_data}" rated {rating:f64} is recorded"#
)]
fn implementation_is_recorded(
    world: &mut TaskBranchWorld,
    pattern_type: String,
    pattern_data: String,
    rating: f64,
) -> Result<(), eyre::Report> {
    let task_id = world.created()?.task.id();
    let implementation = run_async(world.service.record_implementation(
        RecordImplementationRequest::new(task_id, pattern_type, pattern_data)
            .with_success_rating(rating),
    ))
    .wrap_err("record implementation")?;
    world.last_implementation = Some(implementation);
    Ok(())
}

#[when("the task is completed")]
fn task_is_completed(world: &mut TaskBranchWorld) -> Result<(), eyre::Report> {
    let task_id = world.created()?.task.id();
    let result = run_async(world.service.complete_task(task_id));
    world.last_completion_result = Some(result);
    Ok(())
}
