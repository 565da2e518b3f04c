//! `PostgreSQL` session store implementation.

use super::{models::SessionRow, schema::sessions};
use crate::directory::domain::UserId;
use crate::session::{
    domain::{Session, SessionPayload, WizardStep},
    ports::{SessionStore, SessionStoreError, SessionStoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by the session store.
pub type SessionPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed session store.
#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: SessionPgPool,
}

impl PostgresSessionStore {
    /// Creates a store from a connection pool.
    #[must_use]
    pub const fn new(pool: SessionPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> SessionStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> SessionStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(SessionStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(SessionStoreError::persistence)?
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn get(&self, user: &UserId) -> SessionStoreResult<Option<Session>> {
        let owner = user.clone();
        self.run_blocking(move |connection| {
            let row = sessions::table
                .find(owner.as_str())
                .select(SessionRow::as_select())
                .first::<SessionRow>(connection)
                .optional()
                .map_err(SessionStoreError::persistence)?;
            row.map(|found| row_to_session(&owner, found)).transpose()
        })
        .await
    }

    async fn set(&self, session: &Session) -> SessionStoreResult<()> {
        let row = SessionRow {
            user_id: session.user_id().as_str().to_owned(),
            state: session.step().as_str().to_owned(),
            payload: serde_json::to_value(session.payload())
                .map_err(SessionStoreError::persistence)?,
            created_at: session.created_at(),
            updated_at: session.updated_at(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(sessions::table)
                .values(&row)
                .on_conflict(sessions::user_id)
                .do_update()
                .set(&row)
                .execute(connection)
                .map_err(SessionStoreError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn clear(&self, user: &UserId) -> SessionStoreResult<()> {
        let owner = user.as_str().to_owned();
        self.run_blocking(move |connection| {
            diesel::delete(sessions::table.find(owner))
                .execute(connection)
                .map_err(SessionStoreError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn clear_stale(&self, cutoff: DateTime<Utc>) -> SessionStoreResult<Vec<UserId>> {
        self.run_blocking(move |connection| {
            let removed: Vec<String> =
                diesel::delete(sessions::table.filter(sessions::updated_at.lt(cutoff)))
                    .returning(sessions::user_id)
                    .get_results(connection)
                    .map_err(SessionStoreError::persistence)?;
            let mut owners = removed
                .into_iter()
                .map(|owner| UserId::new(owner).map_err(SessionStoreError::persistence))
                .collect::<SessionStoreResult<Vec<_>>>()?;
            owners.sort();
            Ok(owners)
        })
        .await
    }
}

fn row_to_session(owner: &UserId, row: SessionRow) -> SessionStoreResult<Session> {
    let corrupt = |reason: String| SessionStoreError::Corrupt {
        user: owner.clone(),
        reason,
    };
    let step = WizardStep::try_from(row.state.as_str()).map_err(|err| corrupt(err.to_string()))?;
    let payload: SessionPayload =
        serde_json::from_value(row.payload).map_err(|err| corrupt(err.to_string()))?;
    Session::from_persisted(owner.clone(), step, payload, row.created_at, row.updated_at)
        .map_err(|err| corrupt(err.to_string()))
}
