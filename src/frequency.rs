//! Hourly rate estimation from a bounded sample of notices.
//!
//! The event source only hands out the most recent page of notices per
//! error, so the rate is inferred from the span the sample covers.

use chrono::{DateTime, Duration, Utc};

use crate::notice::Notice;

const HOUR_SECONDS: f64 = 3600.0;

/// Estimate how many times per hour an error fires, relative to now.
///
/// `expected_count` is the page size that was requested. When fewer notices
/// came back and the newest is less than an hour old, the sample covers the
/// error's whole recent history, so the window is pinned to one hour instead
/// of the (possibly tiny) observed span. This is a heuristic, not a
/// statistical bound.
pub fn estimate_hourly_rate(notices: &[Notice], expected_count: usize) -> f64 {
    estimate_hourly_rate_at(notices, expected_count, Utc::now())
}

/// Same as [`estimate_hourly_rate`] with an explicit "now"
pub fn estimate_hourly_rate_at(
    notices: &[Notice],
    expected_count: usize,
    now: DateTime<Utc>,
) -> f64 {
    let (Some(oldest), Some(newest)) = (
        notices.iter().map(|n| n.created_at).min(),
        notices.iter().map(|n| n.created_at).max(),
    ) else {
        return 0.0;
    };

    let sparse = notices.len() < expected_count;
    let window_seconds = if sparse && now - newest < Duration::hours(1) {
        HOUR_SECONDS
    } else {
        observed_seconds(now - oldest)
    };

    let rate = notices.len() as f64 / window_seconds * HOUR_SECONDS;
    (rate * 100.0).round() / 100.0
}

/// Observed span in seconds, never below one second
fn observed_seconds(span: Duration) -> f64 {
    let millis = span.num_milliseconds().max(1000);
    millis as f64 / 1000.0
}
