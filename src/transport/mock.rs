//! Scripted transport for tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use super::{FetchError, ResourceTransport};
use crate::models::{PermissionsResponse, SettingsPatch, SiteSettings};

struct Step<T> {
    result: Result<T, String>,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

impl<T> Step<T> {
    async fn play(self) -> Result<T, FetchError> {
        if let Some(gate) = self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.map_err(FetchError::Other)
    }
}

/// Transport that replays queued responses in call order.
///
/// An empty queue answers with an error.
#[derive(Default)]
pub struct ScriptedTransport {
    settings: Mutex<VecDeque<Step<SiteSettings>>>,
    updates: Mutex<VecDeque<Step<SiteSettings>>>,
    permissions: Mutex<VecDeque<Step<PermissionsResponse>>>,
    settings_calls: AtomicUsize,
    update_calls: AtomicUsize,
    permission_roles: Mutex<Vec<String>>,
}

pub fn settings_json(value: Value) -> SiteSettings {
    serde_json::from_value(value).unwrap_or_default()
}

pub fn grants(capabilities: &[(&str, bool)]) -> PermissionsResponse {
    PermissionsResponse {
        permissions: capabilities
            .iter()
            .map(|(name, allowed)| (name.to_string(), *allowed))
            .collect(),
        group_id: None,
        group_name: None,
    }
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push<T>(
        queue: &Mutex<VecDeque<Step<T>>>,
        result: Result<T, String>,
        delay: Option<Duration>,
        gated: bool,
    ) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        queue.lock().push_back(Step {
            result,
            delay,
            gate: gated.then(|| Arc::clone(&gate)),
        });
        gate
    }

    pub fn push_settings(&self, result: Result<SiteSettings, &str>) {
        Self::push(&self.settings, result.map_err(str::to_string), None, false);
    }

    pub fn push_settings_delayed(&self, result: Result<SiteSettings, &str>, delay: Duration) {
        Self::push(&self.settings, result.map_err(str::to_string), Some(delay), false);
    }

    /// Queue a settings response held until the returned gate is notified.
    pub fn push_settings_gated(&self, result: Result<SiteSettings, &str>) -> Arc<Notify> {
        Self::push(&self.settings, result.map_err(str::to_string), None, true)
    }

    pub fn push_update(&self, result: Result<SiteSettings, &str>) {
        Self::push(&self.updates, result.map_err(str::to_string), None, false);
    }

    pub fn push_permissions(&self, result: Result<PermissionsResponse, &str>) {
        Self::push(&self.permissions, result.map_err(str::to_string), None, false);
    }

    pub fn push_permissions_delayed(
        &self,
        result: Result<PermissionsResponse, &str>,
        delay: Duration,
    ) {
        Self::push(&self.permissions, result.map_err(str::to_string), Some(delay), false);
    }

    pub fn push_permissions_gated(&self, result: Result<PermissionsResponse, &str>) -> Arc<Notify> {
        Self::push(&self.permissions, result.map_err(str::to_string), None, true)
    }

    pub fn settings_calls(&self) -> usize {
        self.settings_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Roles requested from `/permissions`, in call order.
    pub fn permission_roles(&self) -> Vec<String> {
        self.permission_roles.lock().clone()
    }

    pub fn permission_calls(&self) -> usize {
        self.permission_roles.lock().len()
    }
}

fn unscripted<T>() -> Step<T> {
    Step {
        result: Err("no scripted response".to_string()),
        delay: None,
        gate: None,
    }
}

#[async_trait]
impl ResourceTransport for ScriptedTransport {
    async fn fetch_settings(&self) -> Result<SiteSettings, FetchError> {
        self.settings_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.settings.lock().pop_front().unwrap_or_else(unscripted);
        step.play().await
    }

    async fn update_settings(&self, _patch: &SettingsPatch) -> Result<SiteSettings, FetchError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.updates.lock().pop_front().unwrap_or_else(unscripted);
        step.play().await
    }

    async fn fetch_permissions(&self, role: &str) -> Result<PermissionsResponse, FetchError> {
        self.permission_roles.lock().push(role.to_string());
        let step = self.permissions.lock().pop_front().unwrap_or_else(unscripted);
        step.play().await
    }
}
