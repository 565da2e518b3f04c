//! Session store behaviour seen through the engine and the scheduler.

use super::helpers::{Harness, at, first_text, harness, kinds, user_id};
use brigade::conversation::{Command, ConversationEngine, ConversationSettings, InboundEvent};
use brigade::notification::domain::MessageKind;
use brigade::reminder::runtime::JobKind;
use brigade::reminder::services::ReminderScheduler;
use brigade::session::domain::WizardStep;
use brigade::session::ports::SessionStore;
use chrono::Duration;
use eyre::ensure;
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clearing_twice_leaves_the_user_idle(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    let creator = &harness.creator;
    harness.press(creator, Command::CreateTask).await;
    ensure!(harness.session(creator).await.is_some(), "wizard not started");

    harness.sessions.clear(creator.id()).await?;
    ensure!(harness.session(creator).await.is_none(), "session survived clear");
    harness.sessions.clear(creator.id()).await?;
    ensure!(harness.session(creator).await.is_none(), "second clear changed state");

    let menu = harness.say(creator, "Restock aisle 4").await;
    ensure!(kinds(&menu) == [MessageKind::Menu], "got {menu:?}");
    ensure!(harness.session(creator).await.is_none(), "idle text started a wizard");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_restarted_engine_continues_registration(
    #[future] harness: Harness,
) -> eyre::Result<()> {
    let harness = harness.await;
    let newcomer = user_id("900");
    let engine_before = ConversationEngine::new(
        harness.lifecycle().clone(),
        Arc::clone(&harness.directory),
        Arc::clone(&harness.sessions),
        Arc::clone(&harness.clock),
        ConversationSettings::default(),
    );
    engine_before
        .handle(InboundEvent::text(newcomer.clone(), "/start"))
        .await?;
    engine_before
        .handle(InboundEvent::text(newcomer.clone(), "Zoe"))
        .await?;
    drop(engine_before);

    let stored = harness.sessions.get(&newcomer).await?;
    ensure!(
        stored.map(|session| session.step()) == Some(WizardStep::RegistrationLastName),
        "registration step not persisted"
    );
    let done = harness
        .engine
        .handle(InboundEvent::text(newcomer.clone(), "Quinn"))
        .await?;
    ensure!(first_text(&done) == "Nice to meet you, Zoe Quinn!", "got {done:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn abandoned_wizards_expire(#[future] harness: Harness) -> eyre::Result<()> {
    let harness = harness.await;
    harness.press(&harness.creator, Command::CreateTask).await;
    harness.clock.set(at(12, 10, 20));
    harness.press(&harness.worker, Command::CreateTask).await;

    let expiring = ReminderScheduler::new(
        Arc::clone(&harness.repository),
        Arc::clone(&harness.directory),
        Arc::clone(&harness.notifier),
        Arc::clone(&harness.sessions),
        Arc::clone(&harness.clock),
    )
    .with_session_ttl(Some(Duration::minutes(30)));

    harness.clock.set(at(12, 10, 45));
    let report = expiring.run(JobKind::SessionExpiry).await?;
    ensure!(report.cleared == 1, "expiry sweep {report}");
    ensure!(harness.session(&harness.creator).await.is_none(), "stale wizard kept");
    ensure!(harness.session(&harness.worker).await.is_some(), "fresh wizard cleared");

    let kept = harness.scheduler.run(JobKind::SessionExpiry).await?;
    ensure!(kept.cleared == 0, "expiry ran without a ttl: {kept}");
    Ok(())
}
