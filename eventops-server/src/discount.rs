//! Time-windowed discount engine
//!
//! Evaluates the admin-configured discount windows against the service
//! clock and validates proposed window sets before they are persisted.
//! Everything here is a pure function of (config, timestamp); both the
//! public menu and the POS cart must go through [`evaluate`] so staff and
//! attendees can never disagree on the current price.
//!
//! Windows are same-day only: `end_time > start_time` is enforced and the
//! next-window preview scans forward within the current day's list. A
//! window crossing midnight (e.g. 23:00-00:30) is not expressible.

use chrono::{DateTime, Utc};
use eventops_common::db::models::DiscountWindow;
use eventops_common::time::{is_valid_hhmm, parse_hhmm_seconds, seconds_of_day, time_of_day};
use serde::Serialize;

/// Preview of the next configured window, shown while no discount is active
/// or alongside the active one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextWindow {
    pub start_time: String,
    pub percentage: f64,
}

/// Result of evaluating the window set at an instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountStatus {
    pub active: bool,
    pub percentage: f64,
    pub description: String,
    pub remaining_minutes: i64,
    pub next_window: Option<NextWindow>,
}

impl DiscountStatus {
    fn inactive(next_window: Option<NextWindow>) -> Self {
        DiscountStatus {
            active: false,
            percentage: 0.0,
            description: "No active discount".to_string(),
            remaining_minutes: 0,
            next_window,
        }
    }
}

/// Evaluate the configured windows at `now`
///
/// A window matches when the time of day falls in `[start, end)`; the end
/// minute itself is never discounted, mirroring the non-overlap rule that
/// lets one window end exactly where the next begins. If validation was
/// bypassed and several windows match, the first in list order wins - a
/// deterministic fallback, not a feature.
pub fn evaluate(windows: &[DiscountWindow], enabled: bool, now: DateTime<Utc>) -> DiscountStatus {
    if !enabled || windows.is_empty() {
        return DiscountStatus::inactive(None);
    }

    let current = time_of_day(&now);

    // Same-day scan only; a window starting tomorrow is not previewed
    let next_window = windows
        .iter()
        .find(|w| w.start_time.as_str() > current.as_str())
        .map(|w| NextWindow {
            start_time: w.start_time.clone(),
            percentage: w.percentage,
        });

    let active = windows
        .iter()
        .find(|w| current.as_str() >= w.start_time.as_str() && current.as_str() < w.end_time.as_str());

    let Some(window) = active else {
        return DiscountStatus::inactive(next_window);
    };

    let remaining_minutes = parse_hhmm_seconds(&window.end_time)
        .map(|end| (end - seconds_of_day(&now)).max(0) / 60)
        .unwrap_or(0);

    DiscountStatus {
        active: true,
        percentage: window.percentage,
        description: window.label.clone(),
        remaining_minutes,
        next_window,
    }
}

/// Validate a proposed window set, collecting every violation
///
/// Returns all problems found rather than failing fast so the admin UI can
/// display the complete list. Indices in messages are 1-based. An empty
/// result means the set may be persisted.
pub fn validate_windows(windows: &[DiscountWindow]) -> Vec<String> {
    let mut errors = Vec::new();

    for (i, window) in windows.iter().enumerate() {
        let n = i + 1;

        if !is_valid_hhmm(&window.start_time) {
            errors.push(format!("Window {n}: start time must be HH:MM (24h)"));
        }
        if !is_valid_hhmm(&window.end_time) {
            errors.push(format!("Window {n}: end time must be HH:MM (24h)"));
        }

        // Fixed-format same-day times compare correctly as strings
        if window.end_time <= window.start_time {
            errors.push(format!("Window {n}: end time must be after start time"));
        }

        if !(0.0..=100.0).contains(&window.percentage) {
            errors.push(format!("Window {n}: percentage must be between 0 and 100"));
        }

        for (j, other) in windows.iter().enumerate().skip(i + 1) {
            if overlaps(window, other) {
                errors.push(format!("Windows {n} and {} overlap", j + 1));
            }
        }
    }

    errors
}

/// Half-open interval intersection over [start, end)
fn overlaps(a: &DiscountWindow, b: &DiscountWindow) -> bool {
    (a.start_time >= b.start_time && a.start_time < b.end_time)
        || (a.end_time > b.start_time && a.end_time <= b.end_time)
        || (a.start_time <= b.start_time && a.end_time >= b.end_time)
}

/// Apply a percentage discount to a base price
///
/// The single pricing helper shared by every call site that turns an
/// [`evaluate`] result into a displayed price.
pub fn apply_discount(base_price: f64, percentage: f64) -> f64 {
    base_price * (1.0 - percentage / 100.0)
}
