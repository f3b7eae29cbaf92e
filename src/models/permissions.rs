//! Role permissions model.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Capability set granted to one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    /// Role this set was fetched for.
    pub role: String,

    /// Backend group the role maps to.
    #[serde(default)]
    pub group_id: Option<i64>,

    #[serde(default)]
    pub group_name: Option<String>,

    /// Capability name -> allowed.
    #[serde(default)]
    pub capabilities: BTreeMap<String, bool>,
}

impl UserPermissions {
    /// Build from a `/permissions` response fetched for `role`.
    pub fn from_response(role: impl Into<String>, response: PermissionsResponse) -> Self {
        Self {
            role: role.into(),
            group_id: response.group_id,
            group_name: response.group_name,
            capabilities: response.permissions,
        }
    }

    /// Check a capability. Unknown capabilities are denied.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.get(name).copied().unwrap_or(false)
    }

    /// Names of all granted capabilities, sorted.
    pub fn granted(&self) -> impl Iterator<Item = &str> {
        self.capabilities
            .iter()
            .filter(|(_, allowed)| **allowed)
            .map(|(name, _)| name.as_str())
    }
}

/// Wire shape of `GET /api/v1/permissions?role={role}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsResponse {
    #[serde(default)]
    pub permissions: BTreeMap<String, bool>,

    #[serde(default, deserialize_with = "lenient_id")]
    pub group_id: Option<i64>,

    #[serde(default)]
    pub group_name: Option<String>,
}

/// Accept group ids sent either as numbers or numeric strings.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(id)) => Ok(Some(id)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid group id: {text}"))),
    }
}
