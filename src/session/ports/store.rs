//! Session store contract.

use crate::directory::domain::UserId;
use crate::session::domain::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for session store operations.
pub type SessionStoreResult<T> = Result<T, SessionStoreError>;

/// Persists one session per user.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the user's session; `None` means idle.
    async fn get(&self, user: &UserId) -> SessionStoreResult<Option<Session>>;

    /// Stores `session`, replacing any previous one for the same user.
    ///
    /// This is a full overwrite, never a merge.
    async fn set(&self, session: &Session) -> SessionStoreResult<()>;

    /// Removes the user's session. Clearing an idle user is a no-op.
    async fn clear(&self, user: &UserId) -> SessionStoreResult<()>;

    /// Removes sessions last written before `cutoff` and returns their
    /// owners.
    async fn clear_stale(&self, cutoff: DateTime<Utc>) -> SessionStoreResult<Vec<UserId>>;
}

/// Errors returned by session stores.
#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    /// A stored session could not be decoded.
    #[error("corrupt session for {user}: {reason}")]
    Corrupt {
        /// Owner of the session.
        user: UserId,
        /// Decoding failure.
        reason: String,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SessionStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
