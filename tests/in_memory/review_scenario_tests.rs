//! Delegation, report, and review round trips driven through the engine.

use super::helpers::{Harness, first_text, harness, kinds};
use brigade::conversation::Command;
use brigade::notification::domain::MessageKind;
use brigade::task::domain::{Assignment, TaskId, TaskStatus};
use brigade::task::services::CreateTaskRequest;
use eyre::ensure;
use rstest::rstest;

async fn delegate(harness: &Harness, assignment: Assignment, subtasks: &[&str]) -> TaskId {
    let request = CreateTaskRequest::new("Restock aisle 4", assignment)
        .with_subtasks(subtasks.iter().map(|title| (*title).to_owned()));
    harness
        .lifecycle()
        .create_task(&harness.creator, request)
        .await
        .expect("task created")
        .id()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignee_toggles_the_last_subtask_and_reports(
    #[future] harness: Harness,
) -> eyre::Result<()> {
    let harness = harness.await;
    let worker = &harness.worker;
    let id = delegate(&harness, Assignment::User(worker.id().clone()), &["Count pallets"]).await;
    harness.notifier.clear();

    harness.press(worker, Command::CompleteTask(id)).await;
    let gated = harness.say(worker, "Shelves full").await;
    ensure!(kinds(&gated) == [MessageKind::ValidationError], "got {gated:?}");
    ensure!(first_text(&gated).contains("1 subtask(s)"), "got {gated:?}");
    ensure!(
        harness.task(id).await.status() == TaskStatus::Active,
        "gate let the report through"
    );
    harness.press(worker, Command::Cancel).await;

    let subtask = harness
        .task(id)
        .await
        .subtasks()
        .first()
        .map(|item| item.id())
        .ok_or_else(|| eyre::eyre!("subtask missing"))?;
    harness.press(worker, Command::ToggleSubtask(id, subtask)).await;
    let progress = harness.task(id).await.progress();
    ensure!(
        progress.map(|done| (done.completed(), done.total())) == Some((1, 1)),
        "got {progress:?}"
    );

    harness.press(worker, Command::CompleteTask(id)).await;
    let sent = harness.say(worker, "Shelves full").await;
    ensure!(first_text(&sent) == "Report sent for review.", "got {sent:?}");

    let task = harness.task(id).await;
    ensure!(task.status() == TaskStatus::PendingReview, "status {}", task.status());
    ensure!(task.report_text() == Some("Shelves full"), "report text lost");
    ensure!(
        harness.received(&harness.creator) == [MessageKind::ReviewRequested],
        "creator got {:?}",
        harness.received(&harness.creator)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejection_clears_the_report_and_tells_the_role(
    #[future] harness: Harness,
) -> eyre::Result<()> {
    let harness = harness.await;
    let id = delegate(&harness, Assignment::Role(harness.pickers), &[]).await;
    harness.press(&harness.picker_a, Command::CompleteTask(id)).await;
    harness.say(&harness.picker_a, "Order 17 packed and labelled").await;
    ensure!(
        harness.task(id).await.status() == TaskStatus::PendingReview,
        "report not submitted"
    );
    harness.notifier.clear();

    let rejected = harness.press(&harness.creator, Command::RejectTask(id)).await;
    ensure!(first_text(&rejected) == "Task sent back to work.", "got {rejected:?}");

    let task = harness.task(id).await;
    ensure!(task.status() == TaskStatus::Active, "status {}", task.status());
    ensure!(task.report_text().is_none(), "report text kept");
    ensure!(task.report_attachments().is_empty(), "report attachments kept");
    for member in [&harness.picker_a, &harness.picker_b] {
        ensure!(
            harness.received(member) == [MessageKind::TaskRejected],
            "{} got {:?}",
            member.display_name(),
            harness.received(member)
        );
    }
    ensure!(harness.received(&harness.creator).is_empty(), "creator notified of own rejection");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn confirmation_closes_the_task_for_the_worker(
    #[future] harness: Harness,
) -> eyre::Result<()> {
    let harness = harness.await;
    let worker = &harness.worker;
    let id = delegate(&harness, Assignment::User(worker.id().clone()), &[]).await;
    harness.press(worker, Command::CompleteTask(id)).await;
    harness.say(worker, "Everything restocked").await;
    harness.notifier.clear();

    let confirmed = harness.press(&harness.creator, Command::ConfirmTask(id)).await;
    ensure!(first_text(&confirmed) == "Task confirmed.", "got {confirmed:?}");
    let task = harness.task(id).await;
    ensure!(task.status() == TaskStatus::Completed, "status {}", task.status());
    ensure!(task.closed_at().is_some(), "closed_at missing");
    ensure!(
        harness.received(worker) == [MessageKind::TaskConfirmed],
        "worker got {:?}",
        harness.received(worker)
    );

    let reopened = harness.press(&harness.creator, Command::ReopenTask(id)).await;
    ensure!(first_text(&reopened) == "Task reopened.", "got {reopened:?}");
    ensure!(
        harness.task(id).await.status() == TaskStatus::Active,
        "task not reopened"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_delivery_keeps_the_transition(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    let worker = &harness.worker;
    let id = delegate(&harness, Assignment::User(worker.id().clone()), &[]).await;
    harness.notifier.fail_for(harness.creator.id().clone());

    harness.press(worker, Command::CompleteTask(id)).await;
    let sent = harness.say(worker, "Everything restocked").await;
    ensure!(first_text(&sent) == "Report sent for review.", "got {sent:?}");
    ensure!(
        harness.task(id).await.status() == TaskStatus::PendingReview,
        "transition rolled back"
    );
    ensure!(harness.received(&harness.creator).is_empty(), "failed delivery recorded");
    Ok(())
}
