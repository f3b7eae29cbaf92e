//! Readiness coordination.
//!
//! Combines the settings cache and (optionally) the permissions cache into
//! a single [`ReadinessPhase`], and offers guards that only hand out data
//! once that phase is `ready`.
//!
//! ## Architecture
//!
//! ```text
//! ResourceCache<SiteSettings> ─┐
//!                              ├─ subscribe ─> recompute ─> watch<ReadinessPhase>
//! RoleWatcher ─> ResourceCache ┘                          └> phase listeners
//! ```
//!
//! The phase is never set directly. Every cache change triggers a
//! synchronous recompute with [`derive_phase`]; listeners only hear about
//! actual transitions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = CoordinatorConfig::default();
//! let coordinator = ReadinessCoordinator::new(settings, watcher, transport, config);
//! tokio::spawn({
//!     let coordinator = coordinator.clone();
//!     async move { coordinator.load().await }
//! });
//!
//! let ready = coordinator.block_until_ready().await?;
//! println!("{}", ready.settings.get(&keys::SITE_TITLE));
//! ```

mod coordinator;
mod guard;
mod phase;

pub use coordinator::{CoordinatorConfig, ReadinessCoordinator, RefreshReport};
pub use guard::{GuardError, Ready};
pub use phase::{ReadinessPhase, derive_phase};
