//! Readiness phase derivation.

use serde::{Deserialize, Serialize};

use crate::cache::ResourceStatus;

/// Externally observable readiness of the included resources.
///
/// Derived from the resource states on every change, never stored by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessPhase {
    /// Nothing has started yet, or nothing decisive has happened.
    Initializing,
    /// An initial load is in flight.
    Loading,
    /// Every included resource has data.
    Ready,
    /// An included resource failed and has no data to fall back on.
    Error,
}

impl ReadinessPhase {
    /// True for phases a blocking guard stops waiting on.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

impl std::fmt::Display for ReadinessPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Derive the phase from the included resources.
///
/// Checked in order: error, loading, ready, initializing.
pub fn derive_phase(resources: &[ResourceStatus]) -> ReadinessPhase {
    let unresolved_failure = resources
        .iter()
        .any(|r| r.has_error && !r.loading && !r.has_data);
    if unresolved_failure {
        return ReadinessPhase::Error;
    }

    if resources.iter().any(|r| r.is_initial_load && r.loading) {
        return ReadinessPhase::Loading;
    }

    if resources.iter().all(|r| r.has_data) {
        return ReadinessPhase::Ready;
    }

    ReadinessPhase::Initializing
}
