//! Resource state record and its transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache record for one globally fetched resource.
///
/// Mutated only through [`fetch_started`](Self::fetch_started),
/// [`fetch_succeeded`](Self::fetch_succeeded), [`fetch_failed`](Self::fetch_failed),
/// [`clear_error`](Self::clear_error) and [`reset`](Self::reset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState<T> {
    /// Last successfully fetched value. A failed fetch never clears it.
    pub data: Option<T>,

    /// True while a fetch for this resource is in flight.
    pub loading: bool,

    /// Message from the most recent failed fetch.
    pub error: Option<String>,

    /// Time of the most recent successful fetch.
    pub last_fetched_at: Option<DateTime<Utc>>,

    /// True until the first fetch settles.
    pub is_initial_load: bool,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_fetched_at: None,
            is_initial_load: true,
        }
    }
}

impl<T> ResourceState<T> {
    /// Create a fresh record (no data, initial load pending).
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetch was issued.
    pub fn fetch_started(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// A fetch resolved with `value`.
    pub fn fetch_succeeded(&mut self, value: T) {
        self.fetch_succeeded_at(value, Utc::now());
    }

    /// Same as [`fetch_succeeded`](Self::fetch_succeeded) with an explicit timestamp.
    pub fn fetch_succeeded_at(&mut self, value: T, at: DateTime<Utc>) {
        self.loading = false;
        self.data = Some(value);
        self.last_fetched_at = Some(at);
        self.error = None;
        self.is_initial_load = false;
    }

    /// A fetch failed. `data` and `last_fetched_at` are left exactly as they were.
    pub fn fetch_failed(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
        self.is_initial_load = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Restore the initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True once a value has been fetched at least once.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Collapse the record into the flags phase derivation looks at.
    pub fn status(&self) -> ResourceStatus {
        ResourceStatus {
            has_data: self.data.is_some(),
            loading: self.loading,
            has_error: self.error.is_some(),
            is_initial_load: self.is_initial_load,
        }
    }
}

/// Type-erased view of a [`ResourceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceStatus {
    pub has_data: bool,
    pub loading: bool,
    pub has_error: bool,
    pub is_initial_load: bool,
}
