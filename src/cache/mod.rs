//! Cache module - Resource caches for globally fetched values.
//!
//! Each resource (site settings, role permissions) lives in its own
//! `ResourceCache`, a pure state machine over a `ResourceState` record.
//! The cache never performs I/O; callers drive fetches through it.
//!
//! ## Architecture
//!
//! - `ResourceState` - The cache record and its transitions
//! - `ResourceCache` - Shared, observable container with single-flight tickets
//! - `is_stale` - TTL-based staleness policy
//! - `ListenerSet` - Synchronous change listeners
//!
//! ## Usage
//!
//! ```rust,ignore
//! let settings: ResourceCache<SiteSettings> = ResourceCache::new("settings");
//!
//! let outcome = settings
//!     .run_fetch(FetchMode::IfIdle, || transport.fetch_settings())
//!     .await;
//!
//! if is_stale(settings.last_fetched_at(), DEFAULT_STALE_TTL) {
//!     // refetch
//! }
//! ```

mod config;
mod listeners;
mod resource;
mod staleness;
mod state;

pub use config::CacheConfig;
pub use listeners::{ListenerSet, Subscription};
pub use resource::{FetchMode, FetchOutcome, FetchTicket, ResourceCache, Settled};
pub use staleness::{DEFAULT_STALE_TTL, is_stale, is_stale_at};
pub use state::{ResourceState, ResourceStatus};
