//! Query windows and display formatting.
//!
//! The store works on absolute instants. Anything that depends on a wall
//! clock (where a day or week starts, how a time is shown) takes the
//! timezone as an argument.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

/// Display format for local times, e.g. `2022-04-03 09:15 PM`.
pub const TIME_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// Returns `(now - hours, now)`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidOperation`] if the start falls outside the
/// representable time range.
pub fn last_hours(now: DateTime<Utc>, hours: i64) -> CoreResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Duration::try_hours(hours)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| {
            CoreError::invalid_operation(format!("window of {hours} hours is out of range"))
        })?;
    Ok((start, now))
}

/// Returns local midnight of the day containing `t` in `tz`.
///
/// If midnight does not exist locally (a DST jump at 00:00) the earliest
/// valid instant of that day's first hour is used.
#[must_use]
pub fn day_start<Tz: TimeZone>(t: DateTime<Utc>, tz: &Tz) -> DateTime<Tz> {
    let local = t.with_timezone(tz).date_naive();
    let midnight = local.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .unwrap_or_else(|| t.with_timezone(tz))
}

/// Returns local Monday 00:00 of the week containing `t` in `tz`.
///
/// Sunday belongs to the week that started six days earlier.
#[must_use]
pub fn week_start<Tz: TimeZone>(t: DateTime<Utc>, tz: &Tz) -> DateTime<Tz> {
    let local = t.with_timezone(tz);
    let back = i64::from(local.weekday().num_days_from_monday());
    day_start((local - Duration::days(back)).with_timezone(&Utc), tz)
}

/// Returns `[start, start + 7 days)` for the week `offset_weeks` before the
/// week containing `now`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidOperation`] if the week falls outside the
/// representable time range.
pub fn week_range<Tz: TimeZone>(
    now: DateTime<Utc>,
    tz: &Tz,
    offset_weeks: i64,
) -> CoreResult<(DateTime<Utc>, DateTime<Utc>)> {
    let out_of_range =
        || CoreError::invalid_operation(format!("week offset {offset_weeks} is out of range"));
    let anchor = Duration::try_weeks(offset_weeks)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(out_of_range)?;
    let start = week_start(anchor, tz).with_timezone(&Utc);
    let end = start
        .checked_add_signed(Duration::days(7))
        .ok_or_else(out_of_range)?;
    Ok((start, end))
}

/// Formats `t` for display in `tz`.
#[must_use]
pub fn format_local<Tz: TimeZone>(t: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    t.with_timezone(tz).format(TIME_FORMAT).to_string()
}
