//! Validation of user-supplied task names and reminder instants.
//!
//! The UI collects a candidate value however it likes; these helpers turn
//! it into something the store accepts, or a validation error.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// How far ahead (in seconds) a reminder is placed when the user gives no time.
pub const DEFAULT_REMINDER_LEAD_SECS: i64 = 3600;

/// Local date-time layouts accepted for reminders, most specific first.
const LOCAL_FORMATS: [&str; 4] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Relative offsets such as `+30m`, `in 2h`, `45s` or `1 day`.
static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:in\s+|\+)?(\d+)\s*(s|secs?|seconds?|m|mins?|minutes?|h|hrs?|hours?|d|days?)$",
    )
    .expect("relative reminder pattern is valid")
});

/// Trim a task name and reject it if nothing is left.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the name is empty after trimming.
pub fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("task name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Parse a reminder instant typed by the user.
///
/// Accepts RFC 3339 (`2024-05-01T09:30:00Z`), a local date-time
/// (`2024-05-01 09:30`), or an offset from `now` (`+30m`, `in 2h`).
///
/// # Errors
///
/// Returns [`Error::Validation`] if the text is not a valid instant.
pub fn parse_reminder(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::validation("reminder time must not be empty"));
    }

    if let Some(caps) = RELATIVE.captures(input) {
        return parse_offset(&caps[1], &caps[2])
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(|| invalid_reminder(input));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| invalid_reminder(input))
}

/// The reminder proposed when the user does not type one: the existing
/// reminder if set, otherwise [`DEFAULT_REMINDER_LEAD_SECS`] from now.
#[must_use]
pub fn default_reminder(existing: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    existing.unwrap_or_else(|| now + Duration::seconds(DEFAULT_REMINDER_LEAD_SECS))
}

fn parse_offset(amount: &str, unit: &str) -> Option<Duration> {
    let amount: i64 = amount.parse().ok()?;
    match unit.to_ascii_lowercase().chars().next()? {
        's' => Duration::try_seconds(amount),
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => None,
    }
}

fn invalid_reminder(input: &str) -> Error {
    Error::validation(format!(
        "invalid reminder time '{input}' (use YYYY-MM-DD HH:MM, RFC 3339, or an offset like +30m)"
    ))
}
