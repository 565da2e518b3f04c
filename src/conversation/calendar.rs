//! Date picking: month grid, time slots, and instant resolution.
//!
//! These functions are pure. The wizard decides what to persist.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Reasons a calendar choice is refused.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CalendarError {
    /// The day lies before today in the viewer's timezone.
    #[error("{0} is in the past, pick today or a later day")]
    PastDay(NaiveDate),

    /// The computed instant is not in the future.
    #[error("that time has already passed, pick a later one")]
    PastInstant,

    /// The wall-clock time does not exist in the viewer's timezone.
    #[error("that time does not exist in your timezone, pick another one")]
    NonexistentLocalTime,

    /// The time is not one of the offered slots.
    #[error("{0} is not one of the offered times")]
    UnknownSlot(NaiveTime),
}

/// Weeks of a month, Monday first. Days outside the month are `None`.
#[must_use]
pub fn month_grid(first_of_month: NaiveDate) -> Vec<Vec<Option<NaiveDate>>> {
    let leading = first_of_month.weekday().num_days_from_monday();
    let mut cells: Vec<Option<NaiveDate>> = (0..leading).map(|_| None).collect();
    cells.extend(
        first_of_month
            .iter_days()
            .take_while(|day| day.month() == first_of_month.month())
            .map(Some),
    );
    let trailing = cells.len().next_multiple_of(7).saturating_sub(cells.len());
    cells.extend((0..trailing).map(|_| None));
    cells.chunks(7).map(<[Option<NaiveDate>]>::to_vec).collect()
}

/// Rejects days strictly before `today`.
///
/// # Errors
///
/// Returns [`CalendarError::PastDay`].
pub fn check_day(day: NaiveDate, today: NaiveDate) -> Result<(), CalendarError> {
    if day < today {
        return Err(CalendarError::PastDay(day));
    }
    Ok(())
}

/// Slots still selectable on `day`. On today, elapsed slots are dropped.
#[must_use]
pub fn available_slots(
    slots: &[NaiveTime],
    day: NaiveDate,
    now_local: NaiveDateTime,
) -> Vec<NaiveTime> {
    let today = now_local.date();
    slots
        .iter()
        .copied()
        .filter(|slot| day > today || (day == today && *slot > now_local.time()))
        .collect()
}

/// Wall-clock time used when the viewer picks "no time".
#[must_use]
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default()
}

/// Converts a local day and optional time to a future UTC instant.
///
/// An ambiguous local time (a DST fold) resolves to the earlier instant.
///
/// # Errors
///
/// Returns [`CalendarError::NonexistentLocalTime`] inside a DST gap and
/// [`CalendarError::PastInstant`] when the instant is not after `now`.
pub fn resolve_instant(
    day: NaiveDate,
    time: Option<NaiveTime>,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, CalendarError> {
    let wall_clock = day.and_time(time.unwrap_or_else(end_of_day));
    let local = tz
        .from_local_datetime(&wall_clock)
        .earliest()
        .ok_or(CalendarError::NonexistentLocalTime)?;
    let instant = local.with_timezone(&Utc);
    if instant <= now {
        return Err(CalendarError::PastInstant);
    }
    Ok(instant)
}

/// Checks that `time` is one of `slots`.
///
/// # Errors
///
/// Returns [`CalendarError::UnknownSlot`].
pub fn check_slot(time: NaiveTime, slots: &[NaiveTime]) -> Result<(), CalendarError> {
    if slots.contains(&time) {
        Ok(())
    } else {
        Err(CalendarError::UnknownSlot(time))
    }
}
