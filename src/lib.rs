//! Atrium - Readiness coordination for site settings and permissions
//!
//! Fetches the global site settings and the permission set of the current
//! role, caches both, and exposes one readiness phase that consumers can
//! observe or block on.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `models` - Settings map with typed accessors, permission sets
//! - `cache` - Observable resource caches with single-flight fetch tickets
//! - `transport` - HTTP access to the settings and permissions endpoints
//! - `permissions` - Session identity and role-change driven refetching
//! - `readiness` - Phase derivation, coordinator and render guards

pub mod cache;
pub mod config;
pub mod models;
pub mod permissions;
pub mod readiness;
pub mod transport;
