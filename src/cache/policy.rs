//! Freshness check shared by the project and README caches

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Project metadata is refreshed after 24 hours
pub const PROJECT_CACHE_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// README documents are refreshed after 7 days
pub const README_CACHE_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Returns true if `cache_time` is present and younger than `duration`.
pub fn is_valid(cache_time: Option<DateTime<Utc>>, duration: Duration) -> bool {
    is_valid_at(cache_time, duration, Utc::now())
}

/// Same as [`is_valid`] against an explicit clock reading.
///
/// Valid iff `now - cache_time < duration`. A timestamp in the future counts as
/// fresh; a duration too large to represent never expires.
pub fn is_valid_at(cache_time: Option<DateTime<Utc>>, duration: Duration, now: DateTime<Utc>) -> bool {
    let Some(cache_time) = cache_time else {
        return false;
    };

    let elapsed = now.signed_duration_since(cache_time);
    match TimeDelta::from_std(duration) {
        Ok(window) => elapsed < window,
        Err(_) => true,
    }
}
