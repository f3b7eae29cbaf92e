//! Site settings model.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Site-wide configuration as returned by `GET /api/v1/settings`.
///
/// The payload is kept as an opaque JSON object. Typed reads go through
/// the [`keys`] table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteSettings(Map<String, Value>);

impl SiteSettings {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw JSON value for `name`, if present.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Read a typed setting, falling back to the key's default when the
    /// setting is absent, null, or has the wrong type.
    pub fn get<T: DeserializeOwned>(&self, key: &SettingKey<T>) -> T {
        match self.0.get(key.name) {
            None | Some(Value::Null) => key.default_value(),
            Some(value) => match T::deserialize(value) {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        "Setting '{}' has unexpected type ({}), using default",
                        key.name, e
                    );
                    key.default_value()
                }
            },
        }
    }

    /// True if `module` is listed in `enabled_modules`.
    pub fn module_enabled(&self, module: &str) -> bool {
        self.get(&keys::ENABLED_MODULES).iter().any(|m| m == module)
    }

    /// True if `feather` is listed in `enabled_feathers`.
    pub fn feather_enabled(&self, feather: &str) -> bool {
        self.get(&keys::ENABLED_FEATHERS).iter().any(|f| f == feather)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named setting with its expected type and default.
pub struct SettingKey<T> {
    name: &'static str,
    default: fn() -> T,
    _type: PhantomData<fn() -> T>,
}

impl<T> SettingKey<T> {
    pub const fn new(name: &'static str, default: fn() -> T) -> Self {
        Self {
            name,
            default,
            _type: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }
}

impl<T> std::fmt::Debug for SettingKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingKey")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

/// Known settings.
pub mod keys {
    use super::SettingKey;

    // General
    pub const SITE_TITLE: SettingKey<String> = SettingKey::new("site_title", String::new);
    pub const DESCRIPTION: SettingKey<String> = SettingKey::new("description", String::new);
    pub const SITE_URL: SettingKey<String> = SettingKey::new("url", String::new);
    pub const LOCALE: SettingKey<String> = SettingKey::new("locale", || "en_US".to_string());
    pub const TIMEZONE: SettingKey<String> = SettingKey::new("timezone", || "UTC".to_string());

    // Appearance
    pub const THEME: SettingKey<String> = SettingKey::new("theme", || "default".to_string());
    pub const POSTS_PER_PAGE: SettingKey<u32> = SettingKey::new("posts_per_page", || 5);
    pub const FEED_ITEMS: SettingKey<u32> = SettingKey::new("feed_items", || 20);

    // Features
    pub const CAN_REGISTER: SettingKey<bool> = SettingKey::new("can_register", || false);
    pub const ENABLE_FEED: SettingKey<bool> = SettingKey::new("enable_feed", || true);
    pub const ENABLE_SEARCH: SettingKey<bool> = SettingKey::new("enable_search", || true);
    pub const DEFAULT_GROUP: SettingKey<i64> = SettingKey::new("default_group", || 0);
    pub const GUEST_GROUP: SettingKey<i64> = SettingKey::new("guest_group", || 0);

    // SEO / social
    pub const META_DESCRIPTION: SettingKey<String> =
        SettingKey::new("meta_description", String::new);
    pub const SOCIAL_IMAGE: SettingKey<Option<String>> =
        SettingKey::new("social_image", || None);

    // Extensions
    pub const ENABLED_MODULES: SettingKey<Vec<String>> =
        SettingKey::new("enabled_modules", Vec::new);
    pub const ENABLED_FEATHERS: SettingKey<Vec<String>> =
        SettingKey::new("enabled_feathers", Vec::new);
    pub const INSTALLED_THEMES: SettingKey<Vec<String>> =
        SettingKey::new("installed_themes", Vec::new);
}

/// Partial settings body for `PUT /api/v1/settings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SettingsPatch(Map<String, Value>);

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a typed setting (builder pattern).
    pub fn set<T: Serialize>(mut self, key: &SettingKey<T>, value: T) -> serde_json::Result<Self> {
        self.0.insert(key.name.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
