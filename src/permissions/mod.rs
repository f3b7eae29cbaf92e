//! Role-scoped permissions.
//!
//! Permissions are fetched per role (`"guest"` when nobody is logged in)
//! and cached in a single `ResourceCache<UserPermissions>`. The
//! `RoleWatcher` keeps that cache aligned with the session.
//!
//! ## Features
//!
//! - Refetch on login/role change, keeping the old set visible meanwhile
//! - Reset before the guest fetch on logout
//! - Single-flight: repeated evaluations never duplicate a fetch
//!
//! ## Usage
//!
//! ```rust,ignore
//! let session = Session::new();
//! let watcher = Arc::new(RoleWatcher::new(cache, transport, &session));
//! watcher.spawn();
//!
//! session.login("42", "admin"); // watcher refetches for "admin"
//! ```

mod identity;
mod watcher;

pub use identity::{GUEST_ROLE, Identity, Session};
pub use watcher::{Evaluation, RoleWatcher};
