//! Task repository behaviour against a real schema.

use super::helpers::{PICKERS, TestDatabase, at, test_runtime, user_id};
use brigade::directory::domain::RoleId;
use brigade::task::domain::{
    Assignment, HistoryAction, HistoryRecord, NewComment, NewTask, NotificationInterval, Task,
    TaskDomainError, TaskHistoryEntry, TaskId, TaskReport, TaskStatus,
};
use brigade::task::ports::{TaskMutation, TaskRepository, TaskRepositoryError};
use chrono::Duration;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use eyre::ensure;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

fn delegated_with_subtasks() -> eyre::Result<NewTask> {
    let draft = NewTask::new(
        "Restock aisle 4",
        user_id("100")?,
        Assignment::User(user_id("200")?),
        at(9, 0)?,
    )?
    .with_description(Some("Cereal and pasta".to_owned()))
    .with_due_date(Some(at(17, 0)? + Duration::days(1)))
    .with_notification_interval(Some(NotificationInterval::from_minutes(60)?))
    .with_subtasks(["Fetch pallet".to_owned(), "Fill shelves".to_owned()])?;
    Ok(draft)
}

fn actions(entries: &[TaskHistoryEntry]) -> Vec<HistoryAction> {
    entries.iter().map(|entry| entry.action).collect()
}

#[rstest]
fn created_task_reads_back_unchanged(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_round_trip")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;
    let repo = db.tasks();

    let created = rt.block_on(repo.create(delegated_with_subtasks()?))?;
    let loaded = rt.block_on(repo.find_by_id(created.id()))?;
    ensure!(loaded.as_ref() == Some(&created), "reloaded task differs: {loaded:?}");
    ensure!(created.status() == TaskStatus::Active, "new task not active");
    ensure!(created.subtasks().len() == 2, "subtasks not stored");
    ensure!(
        created.progress().map(|progress| progress.completed()) == Some(0),
        "fresh subtasks counted as done"
    );

    let history = rt.block_on(repo.history(created.id()))?;
    ensure!(actions(&history) == [HistoryAction::Created], "history {history:?}");
    Ok(())
}

#[rstest]
fn role_assignment_survives_storage(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_role")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;
    let repo = db.tasks();
    let pickers = RoleId::new(PICKERS)?;

    let draft = NewTask::new(
        "Count returns",
        user_id("100")?,
        Assignment::Role(pickers),
        at(9, 0)?,
    )?;
    let created = rt.block_on(repo.create(draft))?;
    let loaded = rt
        .block_on(repo.find_by_id(created.id()))?
        .ok_or_else(|| eyre::eyre!("task missing"))?;
    ensure!(
        loaded.assignment() == &Assignment::Role(pickers),
        "assignment {:?}",
        loaded.assignment()
    );
    Ok(())
}

#[rstest]
fn modify_commits_subtasks_report_and_history(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_modify")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;
    let repo = db.tasks();
    let worker = user_id("200")?;
    let created = rt.block_on(repo.create(delegated_with_subtasks()?))?;
    let subtask_ids: Vec<_> = created.subtasks().iter().map(|subtask| subtask.id()).collect();

    let actor = worker.clone();
    let now = at(11, 0)?;
    rt.block_on(repo.modify(
        created.id(),
        Box::new(
            move |task: &mut Task| -> Result<Vec<HistoryRecord>, TaskDomainError> {
                subtask_ids
                    .iter()
                    .map(|id| task.toggle_subtask(*id, &actor, now))
                    .collect()
            },
        ),
    ))?;

    let actor = worker.clone();
    let submitted_at = at(11, 30)?;
    let report = TaskReport::new(Some("Shelves full".to_owned()), Vec::new())?;
    let submitted = rt.block_on(repo.modify(
        created.id(),
        Box::new(
            move |task: &mut Task| -> Result<Vec<HistoryRecord>, TaskDomainError> {
                task.submit_for_review(report, &actor, submitted_at)
                    .map(|record| vec![record])
            },
        ),
    ))?;

    let loaded = rt
        .block_on(repo.find_by_id(created.id()))?
        .ok_or_else(|| eyre::eyre!("task missing"))?;
    ensure!(loaded == submitted, "stored task differs from returned task");
    ensure!(loaded.status() == TaskStatus::PendingReview, "status {:?}", loaded.status());
    ensure!(loaded.report_text() == Some("Shelves full"), "report not stored");
    ensure!(
        loaded.subtasks().iter().all(|subtask| subtask.is_completed()),
        "subtask completion not stored"
    );
    ensure!(loaded.remaining_subtasks() == 0, "progress not recomputed");

    let history = rt.block_on(repo.history(created.id()))?;
    ensure!(
        actions(&history)
            == [
                HistoryAction::Created,
                HistoryAction::SubtaskToggled,
                HistoryAction::SubtaskToggled,
                HistoryAction::StatusChanged,
            ],
        "history {history:?}"
    );
    Ok(())
}

#[rstest]
fn refused_mutation_rolls_back_every_change(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_rollback")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;
    let repo = db.tasks();
    let worker = user_id("200")?;
    let created = rt.block_on(repo.create(delegated_with_subtasks()?))?;

    let now = at(11, 0)?;
    let report = TaskReport::new(Some("Done early".to_owned()), Vec::new())?;
    let outcome = rt.block_on(repo.modify(
        created.id(),
        Box::new(
            move |task: &mut Task| -> Result<Vec<HistoryRecord>, TaskDomainError> {
                let renamed = task.rename("Restock aisle 5", &worker, now)?;
                let submitted = task.submit_for_review(report, &worker, now)?;
                Ok(vec![renamed, submitted])
            },
        ),
    ));
    ensure!(
        matches!(
            outcome,
            Err(TaskRepositoryError::Rejected(TaskDomainError::SubtasksIncomplete {
                remaining: 2
            }))
        ),
        "unexpected outcome {outcome:?}"
    );

    let loaded = rt.block_on(repo.find_by_id(created.id()))?;
    ensure!(loaded.as_ref() == Some(&created), "refused change leaked: {loaded:?}");
    let history = rt.block_on(repo.history(created.id()))?;
    ensure!(actions(&history) == [HistoryAction::Created], "history {history:?}");
    Ok(())
}

#[rstest]
fn modify_of_a_missing_task_is_not_found(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_missing")?;
    let rt = test_runtime()?;
    let repo = db.tasks();
    let missing = TaskId::new(4242)?;

    let untouched: TaskMutation = Box::new(|_: &mut Task| Ok(Vec::new()));
    let outcome = rt.block_on(repo.modify(missing, untouched));
    ensure!(
        matches!(outcome, Err(TaskRepositoryError::NotFound(id)) if id == missing),
        "unexpected outcome {outcome:?}"
    );
    ensure!(rt.block_on(repo.find_by_id(missing))?.is_none(), "phantom task");
    Ok(())
}

#[rstest]
#[case::both_owners("'200', 7")]
#[case::no_owner("NULL, NULL")]
fn schema_enforces_a_single_owner(
    shared_test_cluster: &'static TestCluster,
    #[case] owners: &str,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_owner_check")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;

    let outcome = db.execute(&format!(
        "INSERT INTO tasks (title, creator_id, assignee_id, assigned_role_id) \
         VALUES ('Broken', '100', {owners})"
    ))?;
    match outcome {
        Err(DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info)) => ensure!(
            info.constraint_name() == Some("tasks_single_assignment"),
            "wrong constraint {:?}",
            info.constraint_name()
        ),
        other => eyre::bail!("insert was not refused: {other:?}"),
    }

    let stored = rt.block_on(db.tasks().list_created_by(&user_id("100")?))?;
    ensure!(stored.is_empty(), "refused row was stored");
    Ok(())
}

#[rstest]
#[case::done_without_time("TRUE, NULL")]
#[case::open_with_time("FALSE, NOW()")]
fn schema_keeps_subtask_completion_in_step(
    shared_test_cluster: &'static TestCluster,
    #[case] completion: &str,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "subtask_check")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;
    let created = rt.block_on(db.tasks().create(delegated_with_subtasks()?))?;

    let outcome = db.execute(&format!(
        "INSERT INTO subtasks (task_id, title, is_completed, completed_at) \
         VALUES ({}, 'Sweep', {completion})",
        created.id()
    ))?;
    match outcome {
        Err(DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info)) => ensure!(
            info.constraint_name() == Some("subtasks_completion_consistent"),
            "wrong constraint {:?}",
            info.constraint_name()
        ),
        other => eyre::bail!("insert was not refused: {other:?}"),
    }
    Ok(())
}

#[rstest]
fn deleting_a_task_removes_its_dependants(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_delete")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;
    let repo = db.tasks();
    let created = rt.block_on(repo.create(delegated_with_subtasks()?))?;
    let comment = NewComment::new(created.id(), user_id("200")?, "On it", at(10, 0)?)?;
    rt.block_on(repo.append_comment(comment))?;
    ensure!(rt.block_on(repo.comments(created.id()))?.len() == 1, "comment not stored");

    rt.block_on(repo.delete(created.id()))?;
    ensure!(rt.block_on(repo.find_by_id(created.id()))?.is_none(), "task survived");
    ensure!(rt.block_on(repo.comments(created.id()))?.is_empty(), "comments survived");
    ensure!(rt.block_on(repo.history(created.id()))?.is_empty(), "history survived");
    let orphans = db.execute(&format!(
        "DELETE FROM subtasks WHERE task_id = {}",
        created.id()
    ))??;
    ensure!(orphans == 0, "{orphans} subtasks survived");

    let again = rt.block_on(repo.delete(created.id()));
    ensure!(
        matches!(again, Err(TaskRepositoryError::NotFound(_))),
        "second delete gave {again:?}"
    );
    Ok(())
}
