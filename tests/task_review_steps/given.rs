//! Given steps for the task review scenarios.

use super::helpers::Harness;
use super::world::{ReviewWorld, run_async};
use brigade::conversation::Command;
use brigade::task::domain::{Assignment, TaskStatus};
use brigade::task::services::CreateTaskRequest;
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("a team with a creator, a worker, and a pickers role")]
fn team(world: &mut ReviewWorld) {
    world.harness = Some(run_async(Harness::assemble()));
}

fn create(world: &mut ReviewWorld, request: CreateTaskRequest) -> Result<(), eyre::Report> {
    let harness = world.harness()?;
    let created = run_async(harness.lifecycle().create_task(&harness.creator, request))
        .wrap_err("create task for review scenario")?;
    harness.notifier.clear();
    world.task_id = Some(created.id());
    Ok(())
}

#[given(r#"the creator delegated "{title}" to the worker with subtask "{subtask}""#)]
fn delegated_to_worker(
    world: &mut ReviewWorld,
    title: String,
    subtask: String,
) -> Result<(), eyre::Report> {
    let worker = world.harness()?.worker.id().clone();
    let request = CreateTaskRequest::new(title, Assignment::User(worker)).with_subtasks([subtask]);
    create(world, request)
}

#[given(r#"the creator delegated "{title}" to the pickers role"#)]
fn delegated_to_role(world: &mut ReviewWorld, title: String) -> Result<(), eyre::Report> {
    let pickers = world.harness()?.pickers;
    create(world, CreateTaskRequest::new(title, Assignment::Role(pickers)))
}

#[given(r#"the creator assigned "{title}" to themselves"#)]
fn self_assigned(world: &mut ReviewWorld, title: String) -> Result<(), eyre::Report> {
    let creator = world.harness()?.creator.id().clone();
    create(world, CreateTaskRequest::new(title, Assignment::User(creator)))
}

#[given(r#"a picker reported "{text}""#)]
fn picker_reported(world: &mut ReviewWorld, text: String) -> Result<(), eyre::Report> {
    let harness = world.harness()?;
    let id = world.task_id()?;
    run_async(harness.press(&harness.picker_a, Command::CompleteTask(id)));
    run_async(harness.say(&harness.picker_a, &text));
    let task = run_async(harness.task(id));
    eyre::ensure!(
        task.status() == TaskStatus::PendingReview,
        "report not submitted, task is {}",
        task.status()
    );
    harness.notifier.clear();
    Ok(())
}
