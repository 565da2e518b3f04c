//! Diesel row models for users and roles.

use super::schema::{roles, user_roles, users};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

/// Query and write model for user records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct UserRow {
    /// Transport identity.
    pub id: String,
    /// Transport username.
    pub username: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Administrator flag.
    pub is_admin: bool,
    /// IANA timezone name.
    pub timezone: String,
    /// First working hour.
    pub work_start: i16,
    /// First hour after work.
    pub work_end: i16,
    /// Local date of the latest digest.
    pub last_summary_sent_on: Option<NaiveDate>,
    /// Onboarding tutorial flag.
    pub tutorial_finished: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query and write model for role records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoleRow {
    /// Role identifier.
    pub id: i64,
    /// Role name.
    pub name: String,
    /// Role description.
    pub description: String,
}

/// Membership row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRoleRow {
    /// Member identity.
    pub user_id: String,
    /// Role identifier.
    pub role_id: i64,
}
