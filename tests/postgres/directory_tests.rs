//! User directory behaviour against a real schema.

use super::helpers::{PICKERS, TestDatabase, at, test_runtime, user_id};
use brigade::directory::domain::{Role, RoleId, Timezone, User, WorkHours};
use brigade::directory::ports::{DirectoryError, UserDirectory};
use chrono::NaiveDate;
use eyre::ensure;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn profile_changes_read_back(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "directory_profile")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;
    let directory = db.directory();
    let worker_id = user_id("200")?;

    let mut worker = rt
        .block_on(directory.find_user(&worker_id))?
        .ok_or_else(|| eyre::eyre!("worker missing"))?;
    worker.set_timezone(Timezone::parse("Asia/Tokyo")?);
    worker.set_work_hours(WorkHours::new(7, 16)?);
    worker.set_first_name("Walter")?;
    let today = NaiveDate::from_ymd_opt(2026, 10, 12)
        .ok_or_else(|| eyre::eyre!("invalid date"))?;
    worker.mark_summary_sent(today);
    worker.finish_tutorial();
    rt.block_on(directory.update_user(&worker))?;

    let loaded = rt.block_on(directory.find_user(&worker_id))?;
    ensure!(loaded.as_ref() == Some(&worker), "profile differs: {loaded:?}");
    Ok(())
}

#[rstest]
fn memberships_are_visible_from_both_sides(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "directory_roles")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;
    let directory = db.directory();
    let pickers = RoleId::new(PICKERS)?;

    let members = rt.block_on(directory.role_members(pickers))?;
    let mut ids: Vec<_> = members.iter().map(|user| user.id().as_str().to_owned()).collect();
    ids.sort();
    ensure!(ids == ["301", "302"], "members {ids:?}");

    let picker = rt
        .block_on(directory.find_user(&user_id("301")?))?
        .ok_or_else(|| eyre::eyre!("picker missing"))?;
    ensure!(picker.is_member_of(pickers), "membership not loaded");

    rt.block_on(directory.assign_role(&user_id("301")?, pickers))?;
    let again = rt.block_on(directory.role_members(pickers))?;
    ensure!(again.len() == 2, "repeated assignment duplicated a member");
    Ok(())
}

#[rstest]
fn duplicate_and_unknown_identities_are_refused(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "directory_refusals")?;
    let rt = test_runtime()?;
    db.seed_team(&rt)?;
    let directory = db.directory();

    let twin = User::register(user_id("200")?, "Walt", "Twin", at(9, 0)?)?;
    let duplicate = rt.block_on(directory.store_user(&twin));
    ensure!(
        matches!(duplicate, Err(DirectoryError::DuplicateUser(_))),
        "duplicate gave {duplicate:?}"
    );

    let ghost = User::register(user_id("999")?, "Gus", "Ghost", at(9, 0)?)?;
    let update = rt.block_on(directory.update_user(&ghost));
    ensure!(
        matches!(update, Err(DirectoryError::UserNotFound(_))),
        "update gave {update:?}"
    );

    let unknown_role = RoleId::new(99)?;
    let assign = rt.block_on(directory.assign_role(&user_id("200")?, unknown_role));
    ensure!(
        matches!(assign, Err(DirectoryError::RoleNotFound(id)) if id == unknown_role),
        "assignment gave {assign:?}"
    );

    let renamed = Role::new(RoleId::new(PICKERS)?, "Order pickers", "Floor")?;
    rt.block_on(directory.store_role(&renamed))?;
    let stored = rt.block_on(directory.find_role(renamed.id()))?;
    ensure!(stored.as_ref() == Some(&renamed), "role upsert lost: {stored:?}");
    Ok(())
}
