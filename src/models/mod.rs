//! Resource payload models.

mod permissions;
mod settings;

pub use permissions::{PermissionsResponse, UserPermissions};
pub use settings::{SettingKey, SettingsPatch, SiteSettings, keys};
