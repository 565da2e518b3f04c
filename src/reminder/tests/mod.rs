//! Sweep, job table, and settings tests.

use crate::clock::ManualClock;
use crate::directory::adapters::memory::InMemoryUserDirectory;
use crate::directory::domain::Timezone;
use crate::directory::ports::UserDirectory;
use crate::notification::adapters::RecordingNotifier;
use crate::notification::domain::MessageKind;
use crate::reminder::domain::SweepReport;
use crate::reminder::runtime::{Dispatch, JobKind, JobTable};
use crate::reminder::services::{DigestCounts, ReminderScheduler};
use crate::reminder::settings::{SchedulerSettings, SettingsError};
use crate::session::adapters::memory::InMemorySessionStore;
use crate::session::domain::{Session, SessionPayload, WizardStep};
use crate::session::ports::SessionStore;
use crate::task::adapters::memory::InMemoryTaskRepository;
use crate::task::domain::{Assignment, NewTask, NotificationInterval, SubtaskId, Task, TaskId};
use crate::task::ports::TaskRepository;
use crate::task::services::CreateTaskRequest;
use crate::test_support::{Team, monday_morning, uid};
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use eyre::ensure;
use rstest::{fixture, rstest};
use std::sync::Arc;

type Scheduler = ReminderScheduler<
    InMemoryTaskRepository,
    InMemoryUserDirectory,
    RecordingNotifier,
    InMemorySessionStore,
    ManualClock,
>;

#[fixture]
async fn team() -> Team {
    Team::assemble().await
}

fn scheduler(team: &Team) -> Scheduler {
    ReminderScheduler::new(
        Arc::clone(&team.repository),
        Arc::clone(&team.directory),
        Arc::clone(&team.notifier),
        Arc::clone(&team.sessions),
        Arc::clone(&team.clock),
    )
    .with_due_reminders(Arc::clone(&team.due_reminders))
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 12, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

async fn assign_to_worker(
    team: &Team,
    due: Option<DateTime<Utc>>,
    interval_minutes: Option<u32>,
) -> TaskId {
    let interval =
        interval_minutes.map(|minutes| NotificationInterval::from_minutes(minutes).expect("interval"));
    let request = CreateTaskRequest::new("Check the cold room", Assignment::User(team.worker.id().clone()))
        .with_due_date(due)
        .with_notification_interval(interval);
    team.lifecycle()
        .create_task(&team.creator, request)
        .await
        .expect("task created")
        .id()
}

fn dated(id: i64, due: Option<DateTime<Utc>>) -> Task {
    NewTask::new("Count", uid("1"), Assignment::User(uid("2")), monday_morning() - Duration::days(7))
        .expect("valid draft")
        .with_due_date(due)
        .into_task(TaskId::new(id).expect("positive id"), std::iter::empty::<SubtaskId>())
}

#[rstest]
fn digest_counts_use_the_local_week() {
    let now = monday_morning();
    let mut cancelled = dated(4, Some(now + Duration::days(1)));
    cancelled.cancel(&uid("1"), now).expect("cancellable");
    let tasks = [
        dated(1, Some(now - Duration::days(1))),
        dated(2, Some(now + Duration::days(2))),
        dated(3, Some(now + Duration::days(7))),
        cancelled,
        dated(5, None),
    ];
    let counts = DigestCounts::of(&tasks, Tz::UTC, now);
    assert_eq!(
        counts,
        DigestCounts {
            active: 4,
            overdue: 1,
            due_this_week: 1,
        }
    );
}

#[rstest]
fn week_window_follows_the_users_zone() {
    // Sunday 23:30 UTC is already Monday in Tokyo, so the week has rolled over.
    let now = Utc.with_ymd_and_hms(2026, 10, 11, 23, 30, 0).single().expect("valid");
    let tasks = [dated(1, Some(now + Duration::hours(1)))];
    assert_eq!(DigestCounts::of(&tasks, Tz::UTC, now).due_this_week, 0);
    assert_eq!(DigestCounts::of(&tasks, Tz::Asia__Tokyo, now).due_this_week, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn digest_waits_for_work_hours_and_runs_once_a_day(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    assign_to_worker(&team, Some(at(9, 0)), None).await;
    team.notifier.clear();

    team.clock.set(at(7, 0));
    let early = sweeps.send_digests().await?;
    ensure!(early.deferred == 6 && early.delivered == 0, "early sweep: {early}");

    team.clock.set(at(10, 0));
    let first = sweeps.send_digests().await?;
    ensure!(first.delivered == 6, "first sweep: {first}");
    let digest = team
        .notifier
        .sent_to(team.worker.id())
        .into_iter()
        .find(|message| message.kind() == MessageKind::Digest)
        .ok_or_else(|| eyre::eyre!("worker got no digest"))?;
    ensure!(digest.text().contains("Active tasks: 1"), "digest text: {}", digest.text());
    ensure!(digest.text().contains("Overdue: 1"), "digest text: {}", digest.text());

    team.clock.set(at(11, 0));
    let repeat = sweeps.send_digests().await?;
    ensure!(repeat.skipped == 6 && repeat.delivered == 0, "repeat sweep: {repeat}");
    let stored = team.reload(&team.worker).await;
    ensure!(
        stored.last_summary_sent_on() == Some(at(10, 0).date_naive()),
        "digest day not recorded"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn digest_catches_up_after_work_hours(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    team.clock.set(at(19, 0));
    let evening = sweeps.send_digests().await?;
    ensure!(evening.delivered == 6 && evening.deferred == 0, "evening sweep: {evening}");
    let stored = team.reload(&team.worker).await;
    ensure!(
        stored.last_summary_sent_on() == Some(at(19, 0).date_naive()),
        "catch-up digest not recorded"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_digest_is_retried(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    team.notifier.fail_for(team.worker.id().clone());
    let first = sweeps.send_digests().await?;
    ensure!(first.failed == 1 && first.delivered == 5, "first sweep: {first}");

    team.notifier.recover(team.worker.id());
    let retry = sweeps.send_digests().await?;
    ensure!(retry.delivered == 1 && retry.skipped == 5, "retry sweep: {retry}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interval_reminder_waits_for_the_full_interval(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    let id = assign_to_worker(&team, None, Some(30)).await;
    team.notifier.clear();

    team.clock.set(at(10, 29));
    let early = sweeps.send_interval_nags().await?;
    ensure!(early.delivered == 0 && early.skipped == 1, "early sweep: {early}");

    team.clock.set(at(10, 31));
    let due = sweeps.send_interval_nags().await?;
    ensure!(due.delivered == 1, "due sweep: {due}");
    let stored = team.repository.find_by_id(id).await?;
    ensure!(
        stored.and_then(|task| task.last_notified_at()) == Some(at(10, 31)),
        "reminder time not recorded"
    );

    team.clock.set(at(10, 45));
    let again = sweeps.send_interval_nags().await?;
    ensure!(again.delivered == 0, "repeated within the interval: {again}");

    team.clock.set(at(11, 2));
    let next = sweeps.send_interval_nags().await?;
    ensure!(next.delivered == 1, "next interval: {next}");
    ensure!(
        team.notifier.sent_of_kind(MessageKind::IntervalReminder).len() == 2,
        "expected exactly two reminders"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_interval_reminder_keeps_the_clock(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    let id = assign_to_worker(&team, None, Some(30)).await;
    team.notifier.fail_for(team.worker.id().clone());

    team.clock.set(at(10, 31));
    let failed = sweeps.send_interval_nags().await?;
    ensure!(failed.failed == 1, "failing sweep: {failed}");
    let stored = team.repository.find_by_id(id).await?;
    ensure!(
        stored.and_then(|task| task.last_notified_at()).is_none(),
        "failed reminder was recorded"
    );

    team.notifier.recover(team.worker.id());
    team.clock.set(at(10, 32));
    let retried = sweeps.send_interval_nags().await?;
    ensure!(retried.delivered == 1, "retry sweep: {retried}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_unreachable_member_does_not_repeat_the_reminder(
    #[future] team: Team,
) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    let request = CreateTaskRequest::new("Pick order 17", Assignment::Role(team.pickers))
        .with_notification_interval(Some(NotificationInterval::from_minutes(30)?));
    let id = team.lifecycle().create_task(&team.creator, request).await?.id();
    team.notifier.clear();
    team.notifier.fail_for(team.picker_b.id().clone());

    team.clock.set(at(10, 31));
    let partial = sweeps.send_interval_nags().await?;
    ensure!(partial.delivered == 1 && partial.failed == 1, "partial sweep: {partial}");
    let stored = team.repository.find_by_id(id).await?;
    ensure!(
        stored.and_then(|task| task.last_notified_at()) == Some(at(10, 31)),
        "partial delivery not recorded"
    );

    for minute in 32..=34 {
        team.clock.set(at(10, minute));
        let quiet = sweeps.send_interval_nags().await?;
        ensure!(quiet.delivered == 0 && quiet.failed == 0, "sweep at 10:{minute}: {quiet}");
    }
    let reminders = team
        .notifier
        .sent_to(team.picker_a.id())
        .iter()
        .filter(|message| message.kind() == MessageKind::IntervalReminder)
        .count();
    ensure!(reminders == 1, "reachable member got {reminders} reminders");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interval_reminder_defers_outside_work_hours(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    let id = assign_to_worker(&team, None, Some(30)).await;

    team.clock.set(at(19, 0));
    let evening = sweeps.send_interval_nags().await?;
    ensure!(evening.deferred == 1 && evening.delivered == 0, "evening sweep: {evening}");
    let stored = team.repository.find_by_id(id).await?;
    ensure!(
        stored.and_then(|task| task.last_notified_at()).is_none(),
        "deferred reminder was recorded"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn due_tomorrow_covers_exactly_the_next_day(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    let tomorrow = at(0, 0) + Duration::days(1);
    assign_to_worker(&team, Some(tomorrow), None).await;
    assign_to_worker(&team, Some(tomorrow + Duration::hours(12)), None).await;
    assign_to_worker(&team, Some(tomorrow + Duration::days(1)), None).await;
    assign_to_worker(&team, Some(at(20, 0)), None).await;

    let report = sweeps.send_due_tomorrow().await?;
    ensure!(report.delivered == 2, "unexpected report: {report}");
    ensure!(
        team.notifier.sent_of_kind(MessageKind::DueTomorrow).len() == 2,
        "expected two due-tomorrow messages"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn due_tomorrow_reaches_recipients_outside_work_hours(
    #[future] team: Team,
) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    let mut worker = team.worker.clone();
    worker.set_timezone(Timezone::from_tz(Tz::Asia__Tokyo));
    team.directory.update_user(&worker).await?;
    assign_to_worker(&team, Some(at(12, 0) + Duration::days(1)), None).await;

    // 09:00 UTC is 18:00 in Tokyo, after the worker's day has ended.
    team.clock.set(at(9, 0));
    let report = sweeps.send_due_tomorrow().await?;
    ensure!(report.delivered == 1 && report.deferred == 0, "unexpected report: {report}");
    ensure!(
        team.notifier.sent_of_kind(MessageKind::DueTomorrow).len() == 1,
        "worker got no due-tomorrow reminder"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn due_tomorrow_window_uses_the_scheduler_zone(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    // 10:00 UTC is 19:00 in Tokyo, where tomorrow starts at 15:00 UTC today.
    let sweeps = scheduler(&team).with_timezone(Tz::Asia__Tokyo);
    assign_to_worker(&team, Some(at(16, 0)), None).await;
    let report = sweeps.send_due_tomorrow().await?;
    ensure!(report.delivered == 1, "unexpected report: {report}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn due_soon_fires_once_regardless_of_work_hours(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    assign_to_worker(&team, Some(at(23, 30) + Duration::days(1)), None).await;

    team.clock.set(at(23, 0));
    ensure!(sweeps.send_due_soon().await.is_idle(), "fired before its time");

    team.clock.set(at(23, 31));
    let fired = sweeps.send_due_soon().await;
    ensure!(fired.delivered == 1, "unexpected report: {fired}");
    ensure!(
        team.notifier.sent_of_kind(MessageKind::DueSoon).len() == 1,
        "expected one due-soon message"
    );

    team.clock.set(at(23, 45));
    ensure!(sweeps.send_due_soon().await.is_idle(), "fired twice");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_due_soon_reminder_is_dropped(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team);
    let id = assign_to_worker(&team, Some(at(12, 0) + Duration::days(1)), None).await;
    // Cancelled behind the lifecycle's back, so the reminder is still queued.
    let creator = team.creator.id().clone();
    team.repository
        .modify(
            id,
            Box::new(move |task| Ok(vec![task.cancel(&creator, at(10, 30))?])),
        )
        .await?;

    team.clock.set(at(12, 1));
    let report = sweeps.send_due_soon().await;
    ensure!(report.skipped == 1 && report.delivered == 0, "unexpected report: {report}");
    ensure!(team.due_reminders.is_empty(), "stale reminder kept");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resync_picks_up_tasks_written_elsewhere(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    let sweeps = scheduler(&team).with_resync(true);
    // A separate table stands in for another process's lifecycle service.
    let elsewhere = team.lifecycle().with_due_reminders(Arc::default());
    let request = CreateTaskRequest::new("Defrost", Assignment::User(team.worker.id().clone()))
        .with_due_date(Some(at(12, 0) + Duration::days(1)));
    elsewhere.create_task(&team.creator, request).await?;
    ensure!(sweeps.send_due_soon().await.is_idle(), "nothing is due yet");

    team.clock.set(at(12, 5));
    let fired = sweeps.send_due_soon().await;
    ensure!(fired.delivered == 1, "unexpected report: {fired}");

    team.clock.set(at(12, 10));
    ensure!(sweeps.send_due_soon().await.is_idle(), "resync resent a reminder");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rebuild_restores_pending_reminders(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    assign_to_worker(&team, Some(at(12, 0) + Duration::days(2)), None).await;
    assign_to_worker(&team, Some(at(11, 0)), None).await;
    let sweeps = scheduler(&team).with_due_reminders(Arc::default());
    let scheduled = sweeps.rebuild_due_reminders().await?;
    ensure!(scheduled == 1, "only future fire times are kept, got {scheduled}");
    ensure!(sweeps.due_reminders().len() == 1, "table not populated");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn session_expiry_clears_idle_wizards(#[future] team: Team) -> eyre::Result<()> {
    let team = team.await;
    for (user, minutes_ago) in [(team.worker.id(), 90), (team.creator.id(), 5)] {
        let session = Session::start(
            user.clone(),
            WizardStep::RegistrationFirstName,
            SessionPayload::Registration { first_name: None },
            at(10, 0) - Duration::minutes(minutes_ago),
        )?;
        team.sessions.set(&session).await?;
    }
    let disabled = scheduler(&team).run(JobKind::SessionExpiry).await?;
    ensure!(disabled == SweepReport::default(), "expiry ran while disabled");

    let sweeps = scheduler(&team).with_session_ttl(Some(Duration::minutes(30)));
    let report = sweeps.run(JobKind::SessionExpiry).await?;
    ensure!(report.cleared == 1, "unexpected report: {report}");
    ensure!(team.sessions.get(team.worker.id()).await?.is_none(), "idle session kept");
    ensure!(team.sessions.get(team.creator.id()).await?.is_some(), "fresh session cleared");
    Ok(())
}

fn kinds(decisions: &[Dispatch]) -> Vec<(JobKind, &'static str)> {
    decisions
        .iter()
        .map(|decision| {
            let label = match decision {
                Dispatch::Run { .. } => "run",
                Dispatch::Misfired { .. } => "misfired",
                Dispatch::Busy(_) => "busy",
            };
            (decision.kind(), label)
        })
        .collect()
}

#[rstest]
fn job_table_runs_due_jobs_and_skips_busy_ones() -> eyre::Result<()> {
    let start = at(10, 0);
    let mut table = JobTable::new(&SchedulerSettings::default(), start)?;
    ensure!(
        table.next_run(JobKind::DueSoon) == Some(start + Duration::seconds(30)),
        "unexpected first due-soon run"
    );

    let first = table.plan(start + Duration::seconds(30));
    ensure!(kinds(&first) == [(JobKind::DueSoon, "run")], "first plan: {:?}", kinds(&first));

    // The due-soon run is still holding its permit.
    let second = table.plan(start + Duration::seconds(90));
    ensure!(
        kinds(&second) == [(JobKind::IntervalNags, "run"), (JobKind::DueSoon, "busy")],
        "second plan: {:?}",
        kinds(&second)
    );
    drop(first);
    let _held = second;

    let third = table.plan(start + Duration::seconds(150));
    ensure!(
        kinds(&third) == [(JobKind::IntervalNags, "busy"), (JobKind::DueSoon, "run")],
        "released permit not reused: {:?}",
        kinds(&third)
    );
    Ok(())
}

#[rstest]
fn job_table_collapses_missed_runs_into_one_misfire() -> eyre::Result<()> {
    let start = at(10, 0);
    let mut table = JobTable::new(&SchedulerSettings::default(), start)?;
    let late = table.plan(start + Duration::minutes(5));
    ensure!(
        kinds(&late) == [(JobKind::IntervalNags, "misfired"), (JobKind::DueSoon, "misfired")],
        "late plan: {:?}",
        kinds(&late)
    );
    ensure!(
        table.next_run(JobKind::IntervalNags) == Some(start + Duration::minutes(6)),
        "next run must follow the evaluation time"
    );
    ensure!(table.plan(start + Duration::minutes(5)).is_empty(), "missed runs replayed");
    Ok(())
}

#[rstest]
fn settings_reject_bad_values() {
    let mut bad_cron = SchedulerSettings::default();
    bad_cron.jobs.digest = "every morning".to_owned();
    assert!(matches!(
        bad_cron.validate(),
        Err(SettingsError::Cron { job: JobKind::Digest, .. })
    ));

    let bad_zone = SchedulerSettings {
        timezone: "Mars/Olympus".to_owned(),
        ..SchedulerSettings::default()
    };
    assert!(matches!(bad_zone.validate(), Err(SettingsError::Timezone(_))));

    let no_pool = SchedulerSettings {
        pool_size: 0,
        ..SchedulerSettings::default()
    };
    assert!(matches!(no_pool.validate(), Err(SettingsError::Zero("pool_size"))));
}

#[rstest]
#[case(None, None)]
#[case(Some(0), None)]
#[case(Some(45), Some(Duration::minutes(45)))]
fn session_ttl_is_optional(#[case] minutes: Option<u32>, #[case] expected: Option<Duration>) {
    let settings = SchedulerSettings {
        session_ttl_minutes: minutes,
        ..SchedulerSettings::default()
    };
    assert_eq!(settings.session_ttl(), expected);
}
