//! Creation, edit, and profile wizards driven end to end.

use super::helpers::{Harness, at, first_text, harness, kinds};
use brigade::conversation::{Command, ProfileField};
use brigade::notification::domain::MessageKind;
use brigade::session::domain::{EditField, SessionPayload, WizardStep};
use brigade::task::domain::{Assignment, TaskStatus};
use brigade::task::services::CreateTaskRequest;
use chrono::{NaiveDate, NaiveTime};
use eyre::ensure;
use rstest::rstest;

fn october(day: u32) -> Command {
    Command::CalendarDay(NaiveDate::from_ymd_opt(2026, 10, day).expect("valid date"))
}

fn slot(hour: u32) -> Command {
    Command::CalendarTime(NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time"))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn minimal_task_assigned_to_self(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    let creator = &harness.creator;

    harness.press(creator, Command::CreateTask).await;
    harness.say(creator, "Buy milk").await;
    harness.press(creator, Command::Skip).await;
    harness.press(creator, Command::Next).await;
    harness.press(creator, Command::Next).await;
    harness.press(creator, Command::CalendarNoDate).await;
    harness.press(creator, Command::NoInterval).await;
    let created = harness.press(creator, Command::AssignSelf).await;
    ensure!(first_text(&created) == "Task created.", "got {created:?}");

    let task = harness.only_task_of(creator).await;
    ensure!(task.title() == "Buy milk", "title {}", task.title());
    ensure!(task.status() == TaskStatus::Active, "status {}", task.status());
    ensure!(
        task.assignment() == &Assignment::User(creator.id().clone()),
        "assignment {:?}",
        task.assignment()
    );
    ensure!(task.progress().is_none(), "progress without subtasks");
    ensure!(task.due_date().is_none(), "due date without a pick");
    ensure!(task.notification_interval().is_none(), "interval without a pick");
    ensure!(harness.notifier.attempts() == 0, "self-assignment notified someone");
    ensure!(harness.step(creator).await.is_none(), "wizard kept");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn declining_cancel_resumes_the_subtask_loop(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    let creator = &harness.creator;
    harness.press(creator, Command::CreateTask).await;
    harness.say(creator, "Restock aisle 4").await;
    harness.press(creator, Command::Skip).await;
    harness.press(creator, Command::AddSubtask).await;
    harness.say(creator, "Count pallets").await;
    harness.press(creator, Command::AddSubtask).await;
    harness.say(creator, "Label shelves").await;
    ensure!(
        harness.step(creator).await == Some(WizardStep::TaskSubtasks),
        "not in the subtask loop"
    );

    let gate = harness.press(creator, Command::Cancel).await;
    ensure!(kinds(&gate) == [MessageKind::Prompt], "got {gate:?}");
    let resumed = harness.press(creator, Command::CancelDecline).await;
    ensure!(first_text(&resumed).contains("Label shelves"), "got {resumed:?}");

    let session = harness
        .session(creator)
        .await
        .ok_or_else(|| eyre::eyre!("session lost"))?;
    ensure!(session.step() == WizardStep::TaskSubtasks, "resumed at {}", session.step());
    let SessionPayload::Creation(draft) = session.payload() else {
        eyre::bail!("unexpected payload {:?}", session.payload());
    };
    ensure!(
        draft.subtasks == ["Count pallets", "Label shelves"],
        "subtasks {:?}",
        draft.subtasks
    );
    ensure!(draft.resume_step.is_none(), "resume marker kept");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn calendar_reentry_from_an_edit(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    let creator = &harness.creator;
    let request = CreateTaskRequest::new("Inventory", Assignment::User(harness.worker.id().clone()))
        .with_due_date(Some(at(14, 12, 0)));
    let id = harness.lifecycle().create_task(creator, request).await?.id();

    harness.press(creator, Command::EditField(id, EditField::DueDate)).await;
    harness.press(creator, october(15)).await;
    ensure!(
        harness.step(creator).await == Some(WizardStep::CalendarTime),
        "time menu not shown"
    );
    harness.press(creator, Command::Back).await;
    ensure!(
        harness.step(creator).await == Some(WizardStep::CalendarDay),
        "back did not return to the day grid"
    );
    harness.press(creator, Command::CalendarNext).await;
    harness.press(creator, Command::CalendarPrev).await;
    harness.press(creator, october(16)).await;
    let updated = harness.press(creator, slot(9)).await;
    ensure!(first_text(&updated) == "Due date updated.", "got {updated:?}");

    ensure!(
        harness.task(id).await.due_date() == Some(at(16, 9, 0)),
        "due date {:?}",
        harness.task(id).await.due_date()
    );
    ensure!(
        harness.due_reminders.get(id).map(|job| job.fire_at) == Some(at(15, 9, 0)),
        "due reminder not moved"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn picks_follow_the_profile_timezone(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    let creator = &harness.creator;
    harness
        .press(creator, Command::EditProfile(ProfileField::Timezone))
        .await;
    let refused = harness.say(creator, "Mars/Olympus").await;
    ensure!(kinds(&refused) == [MessageKind::ValidationError], "got {refused:?}");
    let saved = harness.say(creator, "Asia/Tokyo").await;
    ensure!(first_text(&saved) == "Saved.", "got {saved:?}");

    harness.press(creator, Command::CreateTask).await;
    harness.say(creator, "Night shift handover").await;
    harness.press(creator, Command::Skip).await;
    harness.press(creator, Command::Next).await;
    harness.press(creator, Command::Next).await;
    harness.press(creator, october(13)).await;
    harness.press(creator, slot(18)).await;
    harness.press(creator, Command::NoInterval).await;
    harness.press(creator, Command::AssignRoleMenu).await;
    harness.press(creator, Command::AssignRole(harness.pickers)).await;

    let task = harness.only_task_of(creator).await;
    ensure!(task.due_date() == Some(at(13, 9, 0)), "due date {:?}", task.due_date());
    ensure!(task.assignment() == &Assignment::Role(harness.pickers), "not assigned to the role");
    for member in [&harness.picker_a, &harness.picker_b] {
        ensure!(
            harness.received(member) == [MessageKind::TaskAssigned],
            "{} got {:?}",
            member.display_name(),
            harness.received(member)
        );
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn subtasks_added_after_creation(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    let creator = &harness.creator;
    let request = CreateTaskRequest::new("Inventory", Assignment::User(harness.worker.id().clone()))
        .with_subtasks(["Aisle 1".to_owned()]);
    let id = harness.lifecycle().create_task(creator, request).await?.id();

    harness.press(creator, Command::EditField(id, EditField::Subtasks)).await;
    let added = harness.say(creator, "Aisle 2\n\nAisle 3").await;
    ensure!(first_text(&added) == "Subtasks added.", "got {added:?}");

    let task = harness.task(id).await;
    let titles: Vec<&str> = task.subtasks().iter().map(|item| item.title()).collect();
    ensure!(titles == ["Aisle 1", "Aisle 2", "Aisle 3"], "subtasks {titles:?}");
    ensure!(
        task.progress().map(|done| done.to_string()).as_deref() == Some("0/3"),
        "progress {:?}",
        task.progress()
    );
    Ok(())
}
