//! Session store behaviour against a real schema.

use super::helpers::{TestDatabase, at, test_runtime, user_id};
use brigade::session::domain::{EditField, EditSession, Session, SessionPayload, WizardStep};
use brigade::session::ports::{SessionStore, SessionStoreError};
use brigade::task::domain::TaskId;
use chrono::Duration;
use eyre::ensure;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn set_get_and_clear(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "session_cycle")?;
    let rt = test_runtime()?;
    let store = db.sessions();
    let owner = user_id("200")?;

    ensure!(rt.block_on(store.get(&owner))?.is_none(), "fresh store has a session");

    let editing = SessionPayload::Edit(EditSession::new(TaskId::new(12)?, EditField::Title));
    let started = Session::start(owner.clone(), WizardStep::EditTitle, editing, at(9, 0)?)?;
    rt.block_on(store.set(&started))?;
    ensure!(
        rt.block_on(store.get(&owner))?.as_ref() == Some(&started),
        "stored session differs"
    );

    let advanced = started.clone().advance(
        WizardStep::EditDescription,
        SessionPayload::Edit(EditSession::new(TaskId::new(12)?, EditField::Description)),
        at(9, 5)?,
    )?;
    rt.block_on(store.set(&advanced))?;
    let loaded = rt
        .block_on(store.get(&owner))?
        .ok_or_else(|| eyre::eyre!("session lost on overwrite"))?;
    ensure!(loaded == advanced, "overwrite not stored: {loaded:?}");
    ensure!(loaded.created_at() == started.created_at(), "start time moved");

    rt.block_on(store.clear(&owner))?;
    ensure!(rt.block_on(store.get(&owner))?.is_none(), "session survived clear");
    rt.block_on(store.clear(&owner))?;
    ensure!(rt.block_on(store.get(&owner))?.is_none(), "second clear changed state");
    Ok(())
}

#[rstest]
fn stale_sessions_are_swept(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "session_stale")?;
    let rt = test_runtime()?;
    let store = db.sessions();
    let idle = user_id("301")?;
    let busy = user_id("302")?;

    let old = Session::start(
        idle.clone(),
        WizardStep::ProfileWorkHours,
        SessionPayload::Profile,
        at(6, 0)?,
    )?;
    let fresh = Session::start(
        busy.clone(),
        WizardStep::ProfileTimezone,
        SessionPayload::Profile,
        at(11, 0)?,
    )?;
    rt.block_on(store.set(&old))?;
    rt.block_on(store.set(&fresh))?;

    let removed = rt.block_on(store.clear_stale(at(12, 0)? - Duration::hours(2)))?;
    ensure!(removed == [idle.clone()], "removed {removed:?}");
    ensure!(rt.block_on(store.get(&idle))?.is_none(), "stale session kept");
    ensure!(rt.block_on(store.get(&busy))?.as_ref() == Some(&fresh), "fresh session swept");
    Ok(())
}

#[rstest]
fn mismatched_row_is_reported_as_corrupt(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "session_corrupt")?;
    let rt = test_runtime()?;
    let store = db.sessions();
    let owner = user_id("200")?;

    db.execute(
        "INSERT INTO sessions (user_id, state, payload) \
         VALUES ('200', 'task_comment', '{\"flow\": \"profile\"}'::jsonb)",
    )??;

    let outcome = rt.block_on(store.get(&owner));
    ensure!(
        matches!(&outcome, Err(SessionStoreError::Corrupt { user, .. }) if user == &owner),
        "unexpected outcome {outcome:?}"
    );
    Ok(())
}
