//! When steps for the task review scenarios.

use super::world::{ReviewWorld, run_async};
use brigade::conversation::Command;
use rstest_bdd_macros::when;

#[when("the worker ticks off every subtask")]
fn worker_ticks_subtasks(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let harness = world.harness()?;
    let id = world.task_id()?;
    let subtasks: Vec<_> = world.task()?.subtasks().iter().map(|item| item.id()).collect();
    let mut replies = Vec::new();
    for subtask in subtasks {
        replies = run_async(harness.press(&harness.worker, Command::ToggleSubtask(id, subtask)));
    }
    world.last_replies = replies;
    Ok(())
}

#[when(r#"the worker reports "{text}""#)]
fn worker_reports(world: &mut ReviewWorld, text: String) -> Result<(), eyre::Report> {
    let harness = world.harness()?;
    let id = world.task_id()?;
    run_async(harness.press(&harness.worker, Command::CompleteTask(id)));
    world.last_replies = run_async(harness.say(&harness.worker, &text));
    Ok(())
}

#[when("the creator rejects the task")]
fn creator_rejects(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let harness = world.harness()?;
    let id = world.task_id()?;
    world.last_replies = run_async(harness.press(&harness.creator, Command::RejectTask(id)));
    Ok(())
}

#[when("the creator marks the task done")]
fn creator_marks_done(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let harness = world.harness()?;
    let id = world.task_id()?;
    world.last_replies = run_async(harness.press(&harness.creator, Command::CompleteTask(id)));
    Ok(())
}
