//! Render guards built on the coordinator.
//!
//! - Guard-by-null: `ready_*` return data only once the phase is `ready`.
//! - Guard-by-suspension: `block_until_ready` awaits the phase watch until
//!   it settles, and turns an `error` phase into a `GuardError`.

use super::coordinator::ReadinessCoordinator;
use super::phase::ReadinessPhase;
use crate::models::{SiteSettings, UserPermissions};

/// Data handed out once every included resource is ready.
#[derive(Debug, Clone, PartialEq)]
pub struct Ready {
    pub settings: SiteSettings,
    /// `None` when the coordinator does not include permissions.
    pub permissions: Option<UserPermissions>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// An included resource failed. Carries the failure message verbatim.
    #[error("{0}")]
    Failed(String),

    #[error("readiness coordinator closed")]
    Closed,
}

impl ReadinessCoordinator {
    /// Settings, only while the phase is `ready`.
    pub fn ready_settings(&self) -> Option<SiteSettings> {
        if self.phase() != ReadinessPhase::Ready {
            return None;
        }
        self.settings()
    }

    /// Permissions, only while the phase is `ready`.
    pub fn ready_permissions(&self) -> Option<UserPermissions> {
        if self.phase() != ReadinessPhase::Ready {
            return None;
        }
        self.permissions()
    }

    /// Everything the guard protects, only while the phase is `ready`.
    pub fn ready(&self) -> Option<Ready> {
        if self.phase() != ReadinessPhase::Ready {
            return None;
        }
        let settings = self.settings()?;
        let permissions = if self.includes_permissions() {
            Some(self.permissions()?)
        } else {
            None
        };
        Some(Ready {
            settings,
            permissions,
        })
    }

    /// Wait until the phase is `ready` or `error`.
    ///
    /// Returns immediately if already settled. Dropping the future stops
    /// waiting; it does not cancel any fetch.
    pub async fn block_until_ready(&self) -> Result<Ready, GuardError> {
        let mut phases = self.watch_phase();

        loop {
            let phase = *phases
                .wait_for(|phase| phase.is_settled())
                .await
                .map_err(|_| GuardError::Closed)?;

            if phase == ReadinessPhase::Error {
                let message = self
                    .error()
                    .unwrap_or_else(|| "resource fetch failed".to_string());
                return Err(GuardError::Failed(message));
            }

            if let Some(ready) = self.ready() {
                return Ok(ready);
            }

            // Phase moved on between the wait and the read; wait for the next change.
            phases.changed().await.map_err(|_| GuardError::Closed)?;
        }
    }
}
