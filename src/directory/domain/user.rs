//! User aggregate with timezone and working-hours preferences.

use super::{DirectoryDomainError, RoleId, UserId};
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// IANA timezone attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timezone(Tz);

impl Timezone {
    /// Parses an IANA timezone name such as `Europe/Berlin`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::UnknownTimezone`] when the name is not
    /// a known zone.
    pub fn parse(name: &str) -> Result<Self, DirectoryDomainError> {
        let trimmed = name.trim();
        trimmed
            .parse::<Tz>()
            .map(Self)
            .map_err(|_| DirectoryDomainError::UnknownTimezone(trimmed.to_owned()))
    }

    /// Wraps an already parsed zone.
    #[must_use]
    pub const fn from_tz(tz: Tz) -> Self {
        Self(tz)
    }

    /// Returns the zone used for date arithmetic.
    #[must_use]
    pub const fn tz(self) -> Tz {
        self.0
    }

    /// Returns the canonical zone name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.0.name()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(Tz::UTC)
    }
}

impl TryFrom<String> for Timezone {
    type Error = DirectoryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timezone> for String {
    fn from(value: Timezone) -> Self {
        value.name().to_owned()
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hour-of-day window during which a user accepts reminders.
///
/// The window is half-open: `start` is the first working hour and `end` is the
/// first hour after work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkHours {
    start: u8,
    end: u8,
}

impl WorkHours {
    /// Creates a validated working-hours window.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::InvalidWorkHours`] unless
    /// `0 <= start < end <= 24`.
    pub const fn new(start: u8, end: u8) -> Result<Self, DirectoryDomainError> {
        if start >= end || end > 24 {
            return Err(DirectoryDomainError::InvalidWorkHours { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses a window written as `H-H`, for example `9-18`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::InvalidWorkHours`] when the text is not
    /// two hour numbers forming a valid window.
    pub fn parse(text: &str) -> Result<Self, DirectoryDomainError> {
        let invalid = DirectoryDomainError::InvalidWorkHours { start: 0, end: 0 };
        let (start_text, end_text) = text.trim().split_once('-').ok_or(invalid.clone())?;
        let start = start_text.trim().parse::<u8>().map_err(|_| invalid.clone())?;
        let end = end_text.trim().parse::<u8>().map_err(|_| invalid)?;
        Self::new(start, end)
    }

    /// Returns the first working hour.
    #[must_use]
    pub const fn start(self) -> u8 {
        self.start
    }

    /// Returns the first hour after work.
    #[must_use]
    pub const fn end(self) -> u8 {
        self.end
    }

    /// Returns `true` when `hour` falls inside the window.
    #[must_use]
    pub const fn contains(self, hour: u32) -> bool {
        hour >= self.start as u32 && hour < self.end as u32
    }
}

impl Default for WorkHours {
    fn default() -> Self {
        Self { start: 9, end: 18 }
    }
}

impl fmt::Display for WorkHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Registered participant of the task tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    is_admin: bool,
    timezone: Timezone,
    work_hours: WorkHours,
    roles: BTreeSet<RoleId>,
    last_summary_sent_on: Option<NaiveDate>,
    tutorial_finished: bool,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUserData {
    /// Persisted identity.
    pub id: UserId,
    /// Transport username, if known.
    pub username: Option<String>,
    /// Persisted first name.
    pub first_name: Option<String>,
    /// Persisted last name.
    pub last_name: Option<String>,
    /// Whether the user bypasses access checks.
    pub is_admin: bool,
    /// Persisted timezone.
    pub timezone: Timezone,
    /// Persisted working hours.
    pub work_hours: WorkHours,
    /// Role memberships.
    pub roles: BTreeSet<RoleId>,
    /// Local date of the most recent digest.
    pub last_summary_sent_on: Option<NaiveDate>,
    /// Whether the onboarding tutorial was finished.
    pub tutorial_finished: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

fn normalize_name(value: impl Into<String>) -> Result<String, DirectoryDomainError> {
    let raw = value.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DirectoryDomainError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

impl User {
    /// Registers a new user with default preferences.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::EmptyName`] when either name is blank.
    pub fn register(
        id: UserId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DirectoryDomainError> {
        Ok(Self {
            id,
            username: None,
            first_name: Some(normalize_name(first_name)?),
            last_name: Some(normalize_name(last_name)?),
            is_admin: false,
            timezone: Timezone::default(),
            work_hours: WorkHours::default(),
            roles: BTreeSet::new(),
            last_summary_sent_on: None,
            tutorial_finished: false,
            created_at: now,
        })
    }

    /// Reconstructs a user from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUserData) -> Self {
        Self {
            id: data.id,
            username: data.username,
            first_name: data.first_name,
            last_name: data.last_name,
            is_admin: data.is_admin,
            timezone: data.timezone,
            work_hours: data.work_hours,
            roles: data.roles,
            last_summary_sent_on: data.last_summary_sent_on,
            tutorial_finished: data.tutorial_finished,
            created_at: data.created_at,
        }
    }

    /// Sets the transport username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Grants or revokes the administrator flag.
    #[must_use]
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Sets the user's timezone.
    #[must_use]
    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    /// Sets the user's working hours.
    #[must_use]
    pub fn with_work_hours(mut self, work_hours: WorkHours) -> Self {
        self.work_hours = work_hours;
        self
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Returns the transport username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the first name.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Returns the last name.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Returns `true` for administrators.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Returns the user's timezone.
    #[must_use]
    pub const fn timezone(&self) -> Timezone {
        self.timezone
    }

    /// Returns the user's working hours.
    #[must_use]
    pub const fn work_hours(&self) -> WorkHours {
        self.work_hours
    }

    /// Returns the user's role memberships.
    #[must_use]
    pub const fn roles(&self) -> &BTreeSet<RoleId> {
        &self.roles
    }

    /// Returns `true` when the user belongs to `role`.
    #[must_use]
    pub fn is_member_of(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }

    /// Returns the local date of the latest digest.
    #[must_use]
    pub const fn last_summary_sent_on(&self) -> Option<NaiveDate> {
        self.last_summary_sent_on
    }

    /// Returns `true` once the onboarding tutorial was finished or skipped.
    #[must_use]
    pub const fn tutorial_finished(&self) -> bool {
        self.tutorial_finished
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Human-readable name used in messages and pickers.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_owned(),
            (None, None) => self
                .username
                .clone()
                .unwrap_or_else(|| format!("ID {}", self.id)),
        }
    }

    /// Converts an instant to the user's wall-clock time.
    #[must_use]
    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.timezone.tz())
    }

    /// Returns the user's calendar date at `now`.
    #[must_use]
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_time(now).date_naive()
    }

    /// Returns `true` when `now` falls inside the user's working hours.
    #[must_use]
    pub fn is_within_work_hours(&self, now: DateTime<Utc>) -> bool {
        self.work_hours.contains(self.local_time(now).hour())
    }

    /// Returns `true` once the user's working day has started at `now`,
    /// including the hours after it ended.
    #[must_use]
    pub fn has_started_work(&self, now: DateTime<Utc>) -> bool {
        self.local_time(now).hour() >= u32::from(self.work_hours.start())
    }

    /// Updates the first name.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::EmptyName`] when the value is blank.
    pub fn set_first_name(&mut self, value: impl Into<String>) -> Result<(), DirectoryDomainError> {
        self.first_name = Some(normalize_name(value)?);
        Ok(())
    }

    /// Updates the last name.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::EmptyName`] when the value is blank.
    pub fn set_last_name(&mut self, value: impl Into<String>) -> Result<(), DirectoryDomainError> {
        self.last_name = Some(normalize_name(value)?);
        Ok(())
    }

    /// Replaces the working-hours window.
    pub const fn set_work_hours(&mut self, work_hours: WorkHours) {
        self.work_hours = work_hours;
    }

    /// Replaces the timezone.
    pub const fn set_timezone(&mut self, timezone: Timezone) {
        self.timezone = timezone;
    }

    /// Records that the digest for `date` has been delivered.
    pub const fn mark_summary_sent(&mut self, date: NaiveDate) {
        self.last_summary_sent_on = Some(date);
    }

    /// Marks the onboarding tutorial as done.
    pub const fn finish_tutorial(&mut self) {
        self.tutorial_finished = true;
    }

    /// Adds a role membership, returning `false` if it already existed.
    pub fn add_role(&mut self, role: RoleId) -> bool {
        self.roles.insert(role)
    }

    /// Replaces the membership set with the one held by storage.
    pub(crate) fn replace_roles(&mut self, roles: BTreeSet<RoleId>) {
        self.roles = roles;
    }
}
