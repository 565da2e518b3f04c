//! In-memory session store.

use crate::directory::domain::UserId;
use crate::session::{
    domain::Session,
    ports::{SessionStore, SessionStoreError, SessionStoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory session store.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<UserId, Session>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> SessionStoreError {
    SessionStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user: &UserId) -> SessionStoreResult<Option<Session>> {
        let sessions = self.sessions.read().map_err(lock_error)?;
        Ok(sessions.get(user).cloned())
    }

    async fn set(&self, session: &Session) -> SessionStoreResult<()> {
        let mut sessions = self.sessions.write().map_err(lock_error)?;
        sessions.insert(session.user_id().clone(), session.clone());
        Ok(())
    }

    async fn clear(&self, user: &UserId) -> SessionStoreResult<()> {
        let mut sessions = self.sessions.write().map_err(lock_error)?;
        sessions.remove(user);
        Ok(())
    }

    async fn clear_stale(&self, cutoff: DateTime<Utc>) -> SessionStoreResult<Vec<UserId>> {
        let mut sessions = self.sessions.write().map_err(lock_error)?;
        let mut stale: Vec<UserId> = sessions
            .values()
            .filter(|session| session.updated_at() < cutoff)
            .map(|session| session.user_id().clone())
            .collect();
        stale.sort();
        for user in &stale {
            sessions.remove(user);
        }
        Ok(stale)
    }
}
