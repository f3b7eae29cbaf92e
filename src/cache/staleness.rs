//! Staleness policy.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default time-to-live before a resource is considered stale.
pub const DEFAULT_STALE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Check whether a resource fetched at `last_fetched_at` is stale now.
pub fn is_stale(last_fetched_at: Option<DateTime<Utc>>, ttl: Duration) -> bool {
    is_stale_at(last_fetched_at, ttl, Utc::now())
}

/// Check staleness against an explicit `now`.
///
/// Never-fetched resources are stale. Otherwise stale only when strictly
/// older than `ttl`, so an age of exactly `ttl` is still fresh.
pub fn is_stale_at(
    last_fetched_at: Option<DateTime<Utc>>,
    ttl: Duration,
    now: DateTime<Utc>,
) -> bool {
    let Some(fetched_at) = last_fetched_at else {
        return true;
    };

    let Ok(ttl) = chrono::Duration::from_std(ttl) else {
        // TTL beyond chrono's range never expires.
        return false;
    };

    now.signed_duration_since(fetched_at) > ttl
}
