//! Tick loop that starts due jobs on a bounded worker pool.

use super::job::{Dispatch, JobKind, JobTable};
use crate::directory::ports::UserDirectory;
use crate::notification::ports::Notifier;
use crate::reminder::services::{ReminderError, ReminderScheduler};
use crate::reminder::settings::{SchedulerSettings, SettingsError};
use crate::session::ports::SessionStore;
use crate::task::ports::TaskRepository;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

/// Errors that stop the scheduler runtime.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Settings are invalid.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Startup work failed.
    #[error(transparent)]
    Reminder(#[from] ReminderError),
}

/// Runs reminder jobs on their cron schedules until shut down.
pub struct SchedulerRuntime<R, D, N, S, C>
where
    R: TaskRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
    S: SessionStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    scheduler: Arc<ReminderScheduler<R, D, N, S, C>>,
    clock: Arc<C>,
    table: JobTable,
    pool: Arc<Semaphore>,
    tick: Duration,
}

impl<R, D, N, S, C> SchedulerRuntime<R, D, N, S, C>
where
    R: TaskRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
    S: SessionStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a runtime for `scheduler` from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Settings`] when the settings are invalid.
    pub fn new(
        scheduler: Arc<ReminderScheduler<R, D, N, S, C>>,
        clock: Arc<C>,
        settings: &SchedulerSettings,
    ) -> Result<Self, SchedulerError> {
        settings.validate()?;
        let table = JobTable::new(settings, clock.utc())?;
        Ok(Self {
            scheduler,
            clock,
            table,
            pool: Arc::new(Semaphore::new(settings.pool_size)),
            tick: Duration::from_secs(settings.tick_secs),
        })
    }

    /// Job table, for inspection.
    #[must_use]
    pub const fn table(&self) -> &JobTable {
        &self.table
    }

    /// Rebuilds the due reminder table, then evaluates the job table every
    /// tick until `shutdown` turns `true` or its sender is dropped. Running
    /// jobs are awaited before returning.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Reminder`] when the due reminders cannot be
    /// rebuilt at startup.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), SchedulerError> {
        self.scheduler.rebuild_due_reminders().await?;
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut running = JoinSet::new();
        info!(tick_secs = self.tick.as_secs(), "scheduler started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    for dispatch in self.table.plan(self.clock.utc()) {
                        self.dispatch(&mut running, dispatch);
                    }
                }
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    if let Err(join_error) = joined {
                        error!(%join_error, "job task aborted");
                    }
                }
            }
        }
        info!(running = running.len(), "scheduler stopping");
        while let Some(joined) = running.join_next().await {
            if let Err(join_error) = joined {
                error!(%join_error, "job task aborted");
            }
        }
        info!("scheduler stopped");
        Ok(())
    }

    fn dispatch(&self, running: &mut JoinSet<()>, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Run { kind, permit } => {
                let scheduler = Arc::clone(&self.scheduler);
                let pool = Arc::clone(&self.pool);
                running.spawn(execute(scheduler, pool, kind, permit));
            }
            Dispatch::Misfired { kind, late } => {
                warn!(job = %kind, late_secs = late.num_seconds(), "run missed its grace window");
            }
            Dispatch::Busy(kind) => {
                warn!(job = %kind, "previous run still in progress; skipping");
            }
        }
    }
}

async fn execute<R, D, N, S, C>(
    scheduler: Arc<ReminderScheduler<R, D, N, S, C>>,
    pool: Arc<Semaphore>,
    kind: JobKind,
    instance: OwnedSemaphorePermit,
) where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    let Ok(worker) = pool.acquire_owned().await else {
        return;
    };
    if let Err(err) = scheduler.run(kind).await {
        error!(job = %kind, error = %err, "job failed");
    }
    drop(worker);
    drop(instance);
}
