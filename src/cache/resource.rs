//! Shared resource cache with single-flight fetch tickets.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::listeners::{ListenerSet, Subscription};
use super::state::{ResourceState, ResourceStatus};

/// How a fetch claims its ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Skip if another fetch for this resource is in flight.
    IfIdle,
    /// Always fetch, even if another fetch is in flight.
    Forced,
}

/// Result of [`ResourceCache::run_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Another fetch held the ticket, nothing was issued.
    Skipped,
    /// The fetch resolved and its value was stored.
    Succeeded,
    /// The fetch failed, the message was recorded.
    Failed(String),
    /// The cache was reset while the fetch was in flight. Its result was dropped.
    Discarded,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// True if a network call was actually issued.
    pub fn issued(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Whether a settled ticket changed the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Applied,
    Discarded,
}

struct Cell<T> {
    state: ResourceState<T>,
    /// Tickets issued in the current epoch and not yet settled.
    in_flight: usize,
    /// Bumped by `reset`; tickets from older epochs are discarded.
    epoch: u64,
    next_ticket: u64,
}

struct Shared<T: 'static> {
    name: Arc<str>,
    cell: RwLock<Cell<T>>,
    listeners: ListenerSet<ResourceState<T>>,
}

/// A named state container for one globally fetched resource.
///
/// This cache is:
/// - Thread-safe (state lives behind a lock, transitions are atomic)
/// - Single-flight (ticket claim and `fetch_started` happen in one step)
/// - Clone-friendly (cloning is cheap, shares the same underlying state)
///
/// The cache never performs I/O itself; [`run_fetch`](Self::run_fetch)
/// drives a caller-supplied future through the transitions.
pub struct ResourceCache<T: 'static> {
    inner: Arc<Shared<T>>,
}

// Manual Clone implementation that doesn't require T: Clone
impl<T: 'static> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ResourceCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new cache with the given name, in its initial state.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(Shared {
                name: name.into(),
                cell: RwLock::new(Cell {
                    state: ResourceState::new(),
                    in_flight: 0,
                    epoch: 0,
                    next_ticket: 0,
                }),
                listeners: ListenerSet::new(),
            }),
        }
    }

    /// Get the name of this cache.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ResourceState<T> {
        self.inner.cell.read().state.clone()
    }

    /// Flags used for phase derivation, without cloning the data.
    pub fn status(&self) -> ResourceStatus {
        self.inner.cell.read().state.status()
    }

    /// Last successfully fetched value.
    pub fn data(&self) -> Option<T> {
        self.inner.cell.read().state.data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.cell.read().state.loading
    }

    /// Error of a settled fetch that left no data to fall back on.
    pub fn unresolved_error(&self) -> Option<String> {
        let cell = self.inner.cell.read();
        let state = &cell.state;
        if state.loading || state.data.is_some() {
            return None;
        }
        state.error.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.cell.read().state.error.clone()
    }

    pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.inner.cell.read().state.last_fetched_at
    }

    /// Number of fetches currently holding a ticket.
    pub fn in_flight(&self) -> usize {
        self.inner.cell.read().in_flight
    }

    /// Register a listener called after every state change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ResourceState<T>) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    /// Claim a ticket only if no fetch is in flight.
    ///
    /// The check and the `fetch_started` transition happen under one lock,
    /// so two concurrent callers can never both win.
    pub fn try_begin(&self) -> Option<FetchTicket<T>> {
        self.begin(FetchMode::IfIdle)
    }

    /// Claim a ticket unconditionally.
    pub fn begin_forced(&self) -> FetchTicket<T> {
        let (ticket, snapshot) = {
            let mut cell = self.inner.cell.write();
            self.issue(&mut cell)
        };
        self.inner.listeners.notify(&snapshot);
        ticket
    }

    fn begin(&self, mode: FetchMode) -> Option<FetchTicket<T>> {
        if mode == FetchMode::Forced {
            return Some(self.begin_forced());
        }

        let (ticket, snapshot) = {
            let mut cell = self.inner.cell.write();
            if cell.in_flight > 0 {
                debug!("[{}] fetch already in flight, skipping", self.name());
                return None;
            }
            self.issue(&mut cell)
        };
        self.inner.listeners.notify(&snapshot);
        Some(ticket)
    }

    fn issue(&self, cell: &mut Cell<T>) -> (FetchTicket<T>, ResourceState<T>) {
        cell.in_flight += 1;
        cell.next_ticket += 1;
        cell.state.fetch_started();

        let ticket = FetchTicket {
            cache: self.clone(),
            id: cell.next_ticket,
            epoch: cell.epoch,
            settled: false,
        };
        debug!(
            "[{}] fetch #{} started ({} in flight)",
            self.name(),
            ticket.id,
            cell.in_flight
        );
        (ticket, cell.state.clone())
    }

    fn settle(&self, id: u64, epoch: u64, result: Result<T, String>) -> Settled {
        let snapshot = {
            let mut cell = self.inner.cell.write();
            if cell.epoch != epoch {
                debug!("[{}] fetch #{} resolved after reset, discarded", self.name(), id);
                return Settled::Discarded;
            }

            cell.in_flight = cell.in_flight.saturating_sub(1);
            match result {
                Ok(value) => {
                    cell.state.fetch_succeeded(value);
                    debug!("[{}] fetch #{} succeeded", self.name(), id);
                }
                Err(message) => {
                    warn!("[{}] fetch #{} failed: {}", self.name(), id, message);
                    cell.state.fetch_failed(message);
                }
            }
            // An overlapping forced fetch is still outstanding.
            if cell.in_flight > 0 {
                cell.state.loading = true;
            }
            cell.state.clone()
        };

        self.inner.listeners.notify(&snapshot);
        Settled::Applied
    }

    /// Claim a ticket, await `fetcher`, and settle with its result.
    ///
    /// Errors are flattened to their `Display` string.
    pub async fn run_fetch<F, Fut, E>(&self, mode: FetchMode, fetcher: F) -> FetchOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let Some(ticket) = self.begin(mode) else {
            return FetchOutcome::Skipped;
        };

        match fetcher().await {
            Ok(value) => match ticket.succeed(value) {
                Settled::Applied => FetchOutcome::Succeeded,
                Settled::Discarded => FetchOutcome::Discarded,
            },
            Err(err) => {
                let message = err.to_string();
                match ticket.fail(message.clone()) {
                    Settled::Applied => FetchOutcome::Failed(message),
                    Settled::Discarded => FetchOutcome::Discarded,
                }
            }
        }
    }

    /// Store `value` as if a fetch had just started and succeeded.
    pub fn commit(&self, value: T) {
        let snapshot = {
            let mut cell = self.inner.cell.write();
            cell.state.fetch_started();
            cell.state.fetch_succeeded(value);
            if cell.in_flight > 0 {
                cell.state.loading = true;
            }
            cell.state.clone()
        };
        debug!("[{}] value committed", self.name());
        self.inner.listeners.notify(&snapshot);
    }

    pub fn clear_error(&self) {
        let snapshot = {
            let mut cell = self.inner.cell.write();
            cell.state.clear_error();
            cell.state.clone()
        };
        self.inner.listeners.notify(&snapshot);
    }

    /// Restore the initial state and discard every outstanding ticket.
    pub fn reset(&self) {
        let snapshot = {
            let mut cell = self.inner.cell.write();
            cell.state.reset();
            cell.in_flight = 0;
            cell.epoch += 1;
            cell.state.clone()
        };
        debug!("[{}] reset", self.name());
        self.inner.listeners.notify(&snapshot);
    }
}

impl<T: 'static> std::fmt::Debug for ResourceCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell = self.inner.cell.read();
        f.debug_struct("ResourceCache")
            .field("name", &self.inner.name)
            .field("has_data", &cell.state.data.is_some())
            .field("loading", &cell.state.loading)
            .field("error", &cell.state.error)
            .field("in_flight", &cell.in_flight)
            .finish()
    }
}

/// Claim on one in-flight fetch.
///
/// Dropping an unsettled ticket settles it as failed so `loading`
/// can never stay stuck.
#[must_use = "an unsettled ticket is recorded as a failed fetch"]
pub struct FetchTicket<T: Clone + Send + Sync + 'static> {
    cache: ResourceCache<T>,
    id: u64,
    epoch: u64,
    settled: bool,
}

impl<T: Clone + Send + Sync + 'static> FetchTicket<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn succeed(mut self, value: T) -> Settled {
        self.settled = true;
        self.cache.settle(self.id, self.epoch, Ok(value))
    }

    pub fn fail(mut self, message: impl Into<String>) -> Settled {
        self.settled = true;
        self.cache.settle(self.id, self.epoch, Err(message.into()))
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for FetchTicket<T> {
    fn drop(&mut self) {
        if !self.settled {
            self.cache.settle(
                self.id,
                self.epoch,
                Err("fetch abandoned before completion".to_string()),
            );
        }
    }
}
