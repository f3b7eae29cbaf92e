//! Network transport for the global resources.
//!
//! The caches never talk to the network directly. Everything goes through
//! a `ResourceTransport`, so tests can swap in a scripted backend.
//!
//! ## Endpoints
//!
//! - `GET  /api/v1/settings` - site settings
//! - `PUT  /api/v1/settings` - partial settings update (admin)
//! - `GET  /api/v1/permissions?role={role}` - capability set for a role

mod http;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;

use crate::models::{PermissionsResponse, SettingsPatch, SiteSettings};

pub use http::HttpTransport;

/// Failure of a single fetch.
///
/// The caches flatten this to its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

/// Backend the settings and permissions caches fetch from.
#[async_trait]
pub trait ResourceTransport: Send + Sync {
    async fn fetch_settings(&self) -> Result<SiteSettings, FetchError>;

    /// Apply a partial update and return the full updated settings.
    async fn update_settings(&self, patch: &SettingsPatch) -> Result<SiteSettings, FetchError>;

    async fn fetch_permissions(&self, role: &str) -> Result<PermissionsResponse, FetchError>;
}
