//! Embedded `PostgreSQL` setup shared by the adapter tests.
//!
//! Every test gets its own database cloned from a template that already
//! carries the migrations, and drops it again when the [`TestDatabase`]
//! goes out of scope.

use brigade::directory::adapters::postgres::PostgresUserDirectory;
use brigade::directory::domain::{Role, RoleId, User, UserId};
use brigade::directory::ports::UserDirectory;
use brigade::session::adapters::postgres::PostgresSessionStore;
use brigade::task::adapters::postgres::{PostgresTaskRepository, TaskPgPool};
use chrono::{DateTime, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;

const CREATE_DIRECTORY_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_directory/up.sql");
const CREATE_TASKS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000001_create_tasks/up.sql");
const CREATE_SESSIONS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000002_create_sessions/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "brigade_test_template";

/// Role used by tests that delegate to a group.
pub const PICKERS: i64 = 7;

/// Creates a tokio runtime for driving the async adapters.
pub fn test_runtime() -> eyre::Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Monday 2026-10-12 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> eyre::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2026, 10, 12, hour, minute, 0)
        .single()
        .ok_or_else(|| eyre::eyre!("invalid instant {hour}:{minute}"))
}

/// Parses a user identifier.
pub fn user_id(raw: &str) -> eyre::Result<UserId> {
    Ok(UserId::new(raw)?)
}

fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            for migration in [CREATE_DIRECTORY_SQL, CREATE_TASKS_SQL, CREATE_SESSIONS_SQL] {
                conn.batch_execute(migration)
                    .map_err(|e| eyre::eyre!("migration failed: {e}"))?;
            }
            Ok(())
        })
        .map_err(|e| eyre::eyre!("template setup failed: {e}"))
}

/// A migrated database owned by one test.
pub struct TestDatabase {
    cluster: &'static TestCluster,
    name: String,
    pool: TaskPgPool,
}

impl TestDatabase {
    /// Clones the template into a fresh database named after `label`.
    pub fn create(cluster: &'static TestCluster, label: &str) -> eyre::Result<Self> {
        ensure_template(cluster)?;
        let name = format!("test_{label}_{}", uuid::Uuid::new_v4().simple());
        cluster
            .create_database_from_template(name.as_str(), TEMPLATE_DB)
            .map_err(|e| eyre::eyre!("database {name} not created: {e}"))?;
        let url = cluster.connection().database_url(&name);
        // A single connection keeps statement order deterministic.
        let built = Pool::builder()
            .max_size(1)
            .build(ConnectionManager::<PgConnection>::new(url));
        match built {
            Ok(pool) => Ok(Self {
                cluster,
                name,
                pool,
            }),
            Err(e) => {
                drop_quietly(cluster, &name);
                Err(e.into())
            }
        }
    }

    /// Task repository over this database.
    pub fn tasks(&self) -> PostgresTaskRepository {
        PostgresTaskRepository::new(self.pool.clone())
    }

    /// User directory over this database.
    pub fn directory(&self) -> PostgresUserDirectory {
        PostgresUserDirectory::new(self.pool.clone())
    }

    /// Session store over this database.
    pub fn sessions(&self) -> PostgresSessionStore {
        PostgresSessionStore::new(self.pool.clone())
    }

    /// Runs raw SQL on the pooled connection.
    ///
    /// The outer error is a pool failure; the inner result is the
    /// statement's own outcome. The connection goes back to the pool before
    /// this returns.
    pub fn execute(&self, sql: &str) -> eyre::Result<QueryResult<usize>> {
        let mut conn = self.pool.get()?;
        Ok(diesel::sql_query(sql).execute(&mut *conn))
    }

    /// Stores a creator, a worker, and two pickers sharing the pickers role.
    pub fn seed_team(&self, rt: &Runtime) -> eyre::Result<()> {
        let directory = self.directory();
        let now = at(8, 0)?;
        let pickers = RoleId::new(PICKERS)?;
        rt.block_on(directory.store_role(&Role::new(pickers, "Pickers", "Warehouse floor")?))?;
        for (id, first, last) in [
            ("100", "Carla", "Creator"),
            ("200", "Walt", "Worker"),
            ("301", "Pia", "Picker"),
            ("302", "Pete", "Picker"),
        ] {
            let user = User::register(user_id(id)?, first, last, now)?;
            rt.block_on(directory.store_user(&user))?;
        }
        for picker in ["301", "302"] {
            rt.block_on(directory.assign_role(&user_id(picker)?, pickers))?;
        }
        Ok(())
    }
}

fn drop_quietly(cluster: &TestCluster, name: &str) {
    if let Err(e) = cluster.drop_database(name) {
        tracing::warn!(database = %name, error = %e, "failed to drop test database");
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        drop_quietly(self.cluster, &self.name);
    }
}
