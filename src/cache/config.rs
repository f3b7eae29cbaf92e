//! Cache configuration.

use std::time::Duration;

use super::staleness::DEFAULT_STALE_TTL;

/// Configuration shared by the resource caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Age after which a resource is refetched by `ensure_fresh`.
    pub stale_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_ttl: DEFAULT_STALE_TTL,
        }
    }
}

impl CacheConfig {
    /// Set the staleness window (builder pattern).
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.stale_ttl = duration;
        self
    }
}
