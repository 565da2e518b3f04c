//! Runs the reminder scheduler against `PostgreSQL`.
//!
//! Usage:
//!
//! ```text
//! brigade-scheduler [config.toml]
//! ```
//!
//! Settings not present in the file come from `BRIGADE__*` environment
//! variables or their defaults. Notifications are written to the log; a
//! chat transport plugs in its own notifier.

use brigade::config::BrigadeConfig;
use brigade::directory::adapters::postgres::PostgresUserDirectory;
use brigade::notification::adapters::TracingNotifier;
use brigade::reminder::domain::DueReminderJobs;
use brigade::reminder::runtime::SchedulerRuntime;
use brigade::reminder::services::ReminderScheduler;
use brigade::session::adapters::postgres::PostgresSessionStore;
use brigade::task::adapters::postgres::PostgresTaskRepository;
use brigade::telemetry;
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = BrigadeConfig::load(config_path.as_deref())?;
    telemetry::init_tracing(&config.logging)?;

    let manager = ConnectionManager::<PgConnection>::new(config.database.url.as_str());
    let pool = Pool::builder()
        .max_size(config.database.pool_size)
        .build(manager)?;

    let scheduler_settings = &config.scheduler;
    let clock = Arc::new(DefaultClock);
    let scheduler = ReminderScheduler::new(
        Arc::new(PostgresTaskRepository::new(pool.clone())),
        Arc::new(PostgresUserDirectory::new(pool.clone())),
        Arc::new(TracingNotifier),
        Arc::new(PostgresSessionStore::new(pool)),
        Arc::clone(&clock),
    )
    .with_due_reminders(Arc::new(DueReminderJobs::new(
        scheduler_settings.due_soon_lead(),
    )))
    .with_timezone(scheduler_settings.zone()?)
    .with_session_ttl(scheduler_settings.session_ttl())
    .with_resync(true);
    let runtime = SchedulerRuntime::new(Arc::new(scheduler), clock, scheduler_settings)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(err) => error!(error = %err, "failed to listen for Ctrl-C"),
        }
        if shutdown_tx.send(true).is_err() {
            error!("scheduler already stopped");
        }
    });

    runtime.run(shutdown_rx).await?;
    Ok(())
}
