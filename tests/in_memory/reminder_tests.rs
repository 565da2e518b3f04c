//! Scheduler sweeps over tasks created through the lifecycle service.

use super::helpers::{Harness, at, harness};
use brigade::notification::domain::MessageKind;
use brigade::reminder::runtime::JobKind;
use brigade::task::domain::{Assignment, NotificationInterval, TaskId};
use brigade::task::services::CreateTaskRequest;
use chrono::{DateTime, Utc};
use eyre::ensure;
use rstest::rstest;

async fn assign_worker(
    harness: &Harness,
    due: Option<DateTime<Utc>>,
    interval_minutes: Option<u32>,
) -> TaskId {
    let interval = interval_minutes
        .map(NotificationInterval::from_minutes)
        .transpose()
        .expect("valid interval");
    let request = CreateTaskRequest::new(
        "Restock aisle 4",
        Assignment::User(harness.worker.id().clone()),
    )
    .with_due_date(due)
    .with_notification_interval(interval);
    let id = harness
        .lifecycle()
        .create_task(&harness.creator, request)
        .await
        .expect("task created")
        .id();
    harness.notifier.clear();
    id
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interval_reminder_waits_for_the_full_interval(
    #[future] harness: Harness,
) -> eyre::Result<()> {
    let harness = harness.await;
    let id = assign_worker(&harness, None, Some(30)).await;

    harness.clock.set(at(12, 10, 31));
    let first = harness.scheduler.run(JobKind::IntervalNags).await?;
    ensure!(first.delivered == 1, "first sweep {first}");
    let reminded_at = harness.task(id).await.last_notified_at();
    ensure!(reminded_at == Some(at(12, 10, 31)), "last reminder {reminded_at:?}");

    harness.clock.set(at(12, 11, 0));
    let early = harness.scheduler.run(JobKind::IntervalNags).await?;
    ensure!(early.delivered == 0, "sweep at +29 minutes {early}");
    ensure!(
        harness.task(id).await.last_notified_at() == Some(at(12, 10, 31)),
        "timestamp moved without a delivery"
    );

    harness.clock.set(at(12, 11, 2));
    let due = harness.scheduler.run(JobKind::IntervalNags).await?;
    ensure!(due.delivered == 1, "sweep at +31 minutes {due}");
    ensure!(
        harness.task(id).await.last_notified_at() == Some(at(12, 11, 2)),
        "timestamp not advanced to the sweep"
    );
    ensure!(
        harness.received(&harness.worker)
            == [MessageKind::IntervalReminder, MessageKind::IntervalReminder],
        "worker got {:?}",
        harness.received(&harness.worker)
    );
    ensure!(harness.received(&harness.creator).is_empty(), "creator reminded");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closed_tasks_are_not_reminded(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    let id = assign_worker(&harness, None, Some(15)).await;
    harness.lifecycle().cancel(&harness.creator, id).await?;
    harness.notifier.clear();

    harness.clock.set(at(12, 11, 0));
    let report = harness.scheduler.run(JobKind::IntervalNags).await?;
    ensure!(report.delivered == 0, "cancelled task reminded: {report}");
    ensure!(harness.notifier.attempts() == 0, "something was sent");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn digest_goes_out_once_per_local_day(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    assign_worker(&harness, Some(at(14, 12, 0)), None).await;

    let first = harness.scheduler.run(JobKind::Digest).await?;
    ensure!(first.delivered == 4, "first digest {first}");
    let again = harness.scheduler.run(JobKind::Digest).await?;
    ensure!(again.delivered == 0 && again.skipped == 4, "second digest {again}");

    let digest = harness
        .notifier
        .sent_to(harness.worker.id())
        .into_iter()
        .find(|message| message.kind() == MessageKind::Digest)
        .ok_or_else(|| eyre::eyre!("worker got no digest"))?;
    ensure!(digest.text().contains("Bob Worker"), "digest text {}", digest.text());

    harness.clock.set(at(13, 10, 0));
    let next_day = harness.scheduler.run(JobKind::Digest).await?;
    ensure!(next_day.delivered == 4, "next day digest {next_day}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn due_tomorrow_and_due_soon_reach_the_assignee(
    #[future] harness: Harness,
) -> eyre::Result<()> {
    let harness = harness.await;
    let id = assign_worker(&harness, Some(at(13, 15, 0)), None).await;
    assign_worker(&harness, Some(at(20, 15, 0)), None).await;

    let tomorrow = harness.scheduler.run(JobKind::DueTomorrow).await?;
    ensure!(tomorrow.delivered == 1, "due tomorrow sweep {tomorrow}");

    ensure!(
        harness.due_reminders.get(id).map(|job| job.fire_at) == Some(at(12, 15, 0)),
        "due reminder missing"
    );
    harness.clock.set(at(12, 15, 0));
    let soon = harness.scheduler.run(JobKind::DueSoon).await?;
    ensure!(soon.delivered == 1, "due soon sweep {soon}");
    let repeat = harness.scheduler.run(JobKind::DueSoon).await?;
    ensure!(repeat.delivered == 0, "due soon fired twice: {repeat}");
    ensure!(
        harness.received(&harness.worker) == [MessageKind::DueTomorrow, MessageKind::DueSoon],
        "worker got {:?}",
        harness.received(&harness.worker)
    );
    Ok(())
}
