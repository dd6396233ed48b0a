//! Clock abstraction and timestamp utilities
//!
//! Discount evaluation and wait-time accounting both depend on wall-clock
//! time, so everything that asks "what time is it" goes through the [`Clock`]
//! trait. Production code uses [`SystemClock`]; tests pin the clock with
//! [`FixedClock`] to get deterministic results.

use chrono::{DateTime, Timelike, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current UTC timestamp
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant, for tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Format a timestamp's time of day as zero-padded "HH:MM"
///
/// This is the representation discount windows are configured in, so the
/// comparison against window bounds is a plain string comparison.
pub fn time_of_day(now: &DateTime<Utc>) -> String {
    format!("{:02}:{:02}", now.hour(), now.minute())
}

/// Seconds elapsed since midnight for a timestamp
pub fn seconds_of_day(now: &DateTime<Utc>) -> i64 {
    i64::from(now.num_seconds_from_midnight())
}

/// Parse an "HH:MM" time-of-day string into seconds since midnight
///
/// Returns `None` when the string is not a valid 24h HH:MM time.
pub fn parse_hhmm_seconds(value: &str) -> Option<i64> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    // Digits only; u32 parsing alone would still admit signs like "-1"
    if !hours.bytes().all(|b| b.is_ascii_digit())
        || !minutes.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let hours: i64 = hours.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 3600 + minutes * 60)
}

/// Whether a string is a valid zero-padded 24h "HH:MM" time
pub fn is_valid_hhmm(value: &str) -> bool {
    parse_hhmm_seconds(value).is_some()
}
