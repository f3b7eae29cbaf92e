//! Keeps the permissions cache aligned with the actor's current role.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::identity::{GUEST_ROLE, Identity, Session};
use crate::cache::{FetchMode, FetchOutcome, ResourceCache};
use crate::models::UserPermissions;
use crate::transport::{FetchError, ResourceTransport};

/// Result of one [`RoleWatcher::evaluate`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Cached permissions already belong to the current role.
    UpToDate,
    /// A fetch is already in flight; nothing new was issued.
    InFlight,
    /// The last automatic fetch for this role failed; waiting for a retry
    /// or an identity change.
    Suppressed,
    /// A fetch was issued for `role`.
    Fetched { role: String, outcome: FetchOutcome },
    /// The actor logged out: the cache was reset and guest permissions fetched.
    LoggedOut { outcome: FetchOutcome },
}

/// Watches the session and refetches permissions on role changes.
///
/// The role the cached data belongs to (`stored_role`) is the `role`
/// field of the cached [`UserPermissions`], so it only changes when a
/// fetch succeeds.
pub struct RoleWatcher {
    cache: ResourceCache<UserPermissions>,
    transport: Arc<dyn ResourceTransport>,
    identity: watch::Receiver<Identity>,
    /// Role of the most recently issued fetch that has not settled.
    pending_role: Mutex<Option<String>>,
    /// Role whose last automatic fetch failed.
    suppressed_role: Mutex<Option<String>>,
}

impl RoleWatcher {
    pub fn new(
        cache: ResourceCache<UserPermissions>,
        transport: Arc<dyn ResourceTransport>,
        session: &Session,
    ) -> Self {
        Self {
            cache,
            transport,
            identity: session.subscribe(),
            pending_role: Mutex::new(None),
            suppressed_role: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &ResourceCache<UserPermissions> {
        &self.cache
    }

    /// Role of the current actor (`"guest"` when anonymous).
    pub fn current_role(&self) -> String {
        self.identity.borrow().role().to_string()
    }

    /// Role the cached permissions were fetched for.
    pub fn stored_role(&self) -> Option<String> {
        self.cache.data().map(|perms| perms.role)
    }

    /// No permissions cached yet, or cached for a different role.
    pub fn needs_refresh(&self) -> bool {
        self.stored_role().as_deref() != Some(self.current_role().as_str())
    }

    /// Re-check the session against the cache and fetch if needed.
    pub async fn evaluate(&self) -> Evaluation {
        let identity = self.identity.borrow().clone();

        if identity.is_anonymous() && self.reset_privileged() {
            self.suppressed_role.lock().take();
            let outcome = self.fetch(GUEST_ROLE, FetchMode::IfIdle).await;
            if let FetchOutcome::Failed(_) = outcome {
                *self.suppressed_role.lock() = Some(GUEST_ROLE.to_string());
            }
            return Evaluation::LoggedOut { outcome };
        }

        let role = identity.role();
        if !self.needs_refresh() {
            return Evaluation::UpToDate;
        }
        if self.suppressed_role.lock().as_deref() == Some(role) {
            debug!("Automatic permissions fetch for '{}' suppressed after failure", role);
            return Evaluation::Suppressed;
        }

        if let Some(stored) = self.stored_role() {
            info!("Role changed from '{}' to '{}', refetching permissions", stored, role);
        }

        match self.fetch(role, FetchMode::IfIdle).await {
            FetchOutcome::Skipped => Evaluation::InFlight,
            outcome => {
                if let FetchOutcome::Failed(_) = outcome {
                    *self.suppressed_role.lock() = Some(role.to_string());
                }
                Evaluation::Fetched {
                    role: role.to_string(),
                    outcome,
                }
            }
        }
    }

    /// Fetch permissions for the current role, even if a fetch is in flight.
    ///
    /// While anonymous, privileged permissions are reset before the guest
    /// fetch starts.
    pub async fn force_refresh(&self) -> FetchOutcome {
        self.suppressed_role.lock().take();
        let anonymous = self.identity.borrow().is_anonymous();
        if anonymous {
            self.reset_privileged();
        }
        let role = self.current_role();
        self.fetch(&role, FetchMode::Forced).await
    }

    /// Fetch only if the cache is idle.
    pub async fn refresh_if_idle(&self) -> FetchOutcome {
        let role = self.current_role();
        self.fetch(&role, FetchMode::IfIdle).await
    }

    /// Reset the cache if it holds, or is fetching, a non-guest role.
    ///
    /// The check and the reset happen under the `pending_role` lock so two
    /// concurrent evaluations reset at most once.
    fn reset_privileged(&self) -> bool {
        let privileged = |role: &str| role != GUEST_ROLE;
        let mut pending = self.pending_role.lock();
        let holds_privileged = self.stored_role().as_deref().is_some_and(privileged)
            || pending.as_deref().is_some_and(privileged);
        if !holds_privileged {
            return false;
        }

        info!("Actor logged out, resetting permissions");
        pending.take();
        self.cache.reset();
        true
    }

    async fn fetch(&self, role: &str, mode: FetchMode) -> FetchOutcome {
        let transport = Arc::clone(&self.transport);
        let pending = &self.pending_role;
        let fetch_role = role.to_string();

        let outcome = self
            .cache
            .run_fetch(mode, move || {
                *pending.lock() = Some(fetch_role.clone());
                async move {
                    let response = transport.fetch_permissions(&fetch_role).await?;
                    Ok::<_, FetchError>(UserPermissions::from_response(fetch_role, response))
                }
            })
            .await;

        if outcome.issued() {
            let mut pending = self.pending_role.lock();
            if pending.as_deref() == Some(role) {
                pending.take();
            }
        }
        outcome
    }

    /// Follow the session until it is dropped.
    ///
    /// Re-evaluates on every identity change and after every settled fetch.
    pub async fn run(self: Arc<Self>) {
        let mut identity = self.identity.clone();
        let settled = Arc::new(Notify::new());

        let on_settle = Arc::clone(&settled);
        let _subscription = self.cache.subscribe(move |state| {
            if !state.loading {
                on_settle.notify_one();
            }
        });

        info!("Permissions role watcher started");
        identity.borrow_and_update();
        self.spawn_evaluation();

        // Evaluations run as their own tasks so a logout is seen while a
        // privileged fetch is still pending.
        loop {
            tokio::select! {
                changed = identity.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.suppressed_role.lock().take();
                }
                _ = settled.notified() => {}
            }

            self.spawn_evaluation();
        }

        info!("Session closed, role watcher stopped");
    }

    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run())
    }

    fn spawn_evaluation(self: &Arc<Self>) -> JoinHandle<Evaluation> {
        let watcher = Arc::clone(self);
        tokio::spawn(async move {
            let evaluation = watcher.evaluate().await;
            debug!("Permissions evaluation: {:?}", evaluation);
            evaluation
        })
    }
}

impl std::fmt::Debug for RoleWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleWatcher")
            .field("current_role", &self.current_role())
            .field("stored_role", &self.stored_role())
            .field("pending_role", &*self.pending_role.lock())
            .finish()
    }
}
