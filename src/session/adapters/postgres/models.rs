//! Diesel row model for sessions.

use super::schema::sessions;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Session row, used for reads and upserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SessionRow {
    /// Owner identity.
    pub user_id: String,
    /// Wizard step tag.
    pub state: String,
    /// Flow payload.
    pub payload: Value,
    /// Wizard start.
    pub created_at: DateTime<Utc>,
    /// Last write.
    pub updated_at: DateTime<Utc>,
}
