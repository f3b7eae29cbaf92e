//! Readiness coordinator over the settings and permissions caches.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::join;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::phase::{ReadinessPhase, derive_phase};
use crate::cache::{
    CacheConfig, FetchMode, FetchOutcome, ListenerSet, ResourceCache, Subscription, is_stale,
};
use crate::models::{SettingKey, SettingsPatch, SiteSettings, UserPermissions};
use crate::permissions::RoleWatcher;
use crate::transport::{FetchError, ResourceTransport};

/// Coordinator options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Wait on permissions as well as settings.
    pub include_permissions: bool,

    /// Minimum time a loading indicator should stay visible.
    ///
    /// Stored for the rendering layer; phase transitions do not wait on it.
    pub min_loading_duration: Duration,

    pub cache: CacheConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            include_permissions: true,
            min_loading_duration: Duration::ZERO,
            cache: CacheConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Config that waits on settings alone.
    pub fn settings_only() -> Self {
        Self {
            include_permissions: false,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn include_permissions(mut self, include: bool) -> Self {
        self.include_permissions = include;
        self
    }

    #[must_use]
    pub fn min_loading_duration(mut self, duration: Duration) -> Self {
        self.min_loading_duration = duration;
        self
    }

    #[must_use]
    pub fn stale_ttl(mut self, ttl: Duration) -> Self {
        self.cache = self.cache.ttl(ttl);
        self
    }
}

/// Per-resource result of a refresh.
///
/// `None` means the resource was not fetched (excluded, or still fresh).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefreshReport {
    pub settings: Option<FetchOutcome>,
    pub permissions: Option<FetchOutcome>,
}

struct Inner {
    settings: ResourceCache<SiteSettings>,
    watcher: Arc<RoleWatcher>,
    transport: Arc<dyn ResourceTransport>,
    config: CoordinatorConfig,
    phase_tx: watch::Sender<ReadinessPhase>,
    listeners: ListenerSet<ReadinessPhase>,
    _subscriptions: Vec<Subscription>,
}

impl Inner {
    fn compute_phase(&self) -> ReadinessPhase {
        compute_phase(
            &self.settings,
            self.config
                .include_permissions
                .then(|| self.watcher.cache()),
        )
    }

    /// Recompute the phase and notify listeners if it changed.
    fn recompute(&self) {
        let mut changed_to = None;
        // Computed under the watch lock so concurrent recomputes serialize.
        self.phase_tx.send_if_modified(|current| {
            let phase = self.compute_phase();
            if *current == phase {
                return false;
            }
            debug!("Readiness phase {} -> {}", current, phase);
            *current = phase;
            changed_to = Some(phase);
            true
        });

        if let Some(phase) = changed_to {
            self.listeners.notify(&phase);
        }
    }
}

fn compute_phase(
    settings: &ResourceCache<SiteSettings>,
    permissions: Option<&ResourceCache<UserPermissions>>,
) -> ReadinessPhase {
    let mut statuses = vec![settings.status()];
    if let Some(permissions) = permissions {
        statuses.push(permissions.status());
    }
    derive_phase(&statuses)
}

/// Combines the settings and permissions caches into one readiness phase.
///
/// Cloning is cheap and shares the same state. The phase is recomputed
/// synchronously whenever either included cache changes.
#[derive(Clone)]
pub struct ReadinessCoordinator {
    inner: Arc<Inner>,
}

impl ReadinessCoordinator {
    pub fn new(
        settings: ResourceCache<SiteSettings>,
        watcher: Arc<RoleWatcher>,
        transport: Arc<dyn ResourceTransport>,
        config: CoordinatorConfig,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let mut subscriptions = vec![settings.subscribe(recompute_on_change(weak))];
            if config.include_permissions {
                subscriptions.push(watcher.cache().subscribe(recompute_on_change(weak)));
            }

            let initial = compute_phase(
                &settings,
                config.include_permissions.then(|| watcher.cache()),
            );
            let (phase_tx, _) = watch::channel(initial);

            Inner {
                settings,
                watcher,
                transport,
                config,
                phase_tx,
                listeners: ListenerSet::new(),
                _subscriptions: subscriptions,
            }
        });

        Self { inner }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Configured minimum loading duration. Not applied to phase transitions.
    pub fn min_loading_duration(&self) -> Duration {
        self.inner.config.min_loading_duration
    }

    pub fn includes_permissions(&self) -> bool {
        self.inner.config.include_permissions
    }

    pub fn settings_cache(&self) -> &ResourceCache<SiteSettings> {
        &self.inner.settings
    }

    pub fn permissions_cache(&self) -> &ResourceCache<UserPermissions> {
        self.inner.watcher.cache()
    }

    pub fn watcher(&self) -> &Arc<RoleWatcher> {
        &self.inner.watcher
    }

    pub fn phase(&self) -> ReadinessPhase {
        *self.inner.phase_tx.borrow()
    }

    /// Receiver that observes every phase change.
    pub fn watch_phase(&self) -> watch::Receiver<ReadinessPhase> {
        self.inner.phase_tx.subscribe()
    }

    /// Register a listener called synchronously on every phase change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ReadinessPhase) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    /// Last fetched settings, ignoring readiness.
    pub fn settings(&self) -> Option<SiteSettings> {
        self.inner.settings.data()
    }

    /// Last fetched permissions, ignoring readiness.
    pub fn permissions(&self) -> Option<UserPermissions> {
        self.inner.watcher.cache().data()
    }

    /// Typed setting lookup; the key's default when settings are not loaded.
    pub fn setting<T: DeserializeOwned>(&self, key: &SettingKey<T>) -> T {
        match self.inner.settings.data() {
            Some(settings) => settings.get(key),
            None => key.default_value(),
        }
    }

    /// Check a capability against the cached permissions.
    pub fn has_capability(&self, name: &str) -> bool {
        self.permissions()
            .is_some_and(|perms| perms.has_capability(name))
    }

    /// Error of the included resources.
    ///
    /// An error that leaves a resource without data comes first, since that
    /// is the one holding the phase at `error`.
    pub fn error(&self) -> Option<String> {
        let settings = &self.inner.settings;
        let permissions = self
            .includes_permissions()
            .then(|| self.inner.watcher.cache());

        settings
            .unresolved_error()
            .or_else(|| permissions.and_then(|p| p.unresolved_error()))
            .or_else(|| settings.error())
            .or_else(|| permissions.and_then(|p| p.error()))
    }

    /// Initial load: fetch every included resource that has no data and
    /// no fetch in flight.
    pub async fn load(&self) -> RefreshReport {
        let settings = async {
            if self.inner.settings.status().has_data {
                None
            } else {
                Some(self.fetch_settings(FetchMode::IfIdle).await)
            }
        };
        let permissions = async {
            if self.includes_permissions() && self.inner.watcher.needs_refresh() {
                Some(self.inner.watcher.refresh_if_idle().await)
            } else {
                None
            }
        };

        let (settings, permissions) = join(settings, permissions).await;
        RefreshReport {
            settings,
            permissions,
        }
    }

    /// Fetch every included resource, even if fetches are already in flight.
    pub async fn refresh(&self) -> RefreshReport {
        let settings = self.fetch_settings(FetchMode::Forced);
        let permissions = async {
            if self.includes_permissions() {
                Some(self.inner.watcher.force_refresh().await)
            } else {
                None
            }
        };

        let (settings, permissions) = join(settings, permissions).await;
        RefreshReport {
            settings: Some(settings),
            permissions,
        }
    }

    /// User-initiated retry after an error. Same as [`refresh`](Self::refresh).
    pub async fn retry(&self) -> RefreshReport {
        info!("Retrying resource fetches (phase: {})", self.phase());
        self.refresh().await
    }

    /// Refetch only the included resources whose data is stale.
    pub async fn ensure_fresh(&self) -> RefreshReport {
        let ttl = self.inner.config.cache.stale_ttl;

        let settings = async {
            if is_stale(self.inner.settings.last_fetched_at(), ttl) {
                Some(self.fetch_settings(FetchMode::IfIdle).await)
            } else {
                None
            }
        };
        let permissions = async {
            let cache = self.inner.watcher.cache();
            if self.includes_permissions() && is_stale(cache.last_fetched_at(), ttl) {
                Some(self.inner.watcher.refresh_if_idle().await)
            } else {
                None
            }
        };

        let (settings, permissions) = join(settings, permissions).await;
        RefreshReport {
            settings,
            permissions,
        }
    }

    /// Apply an admin settings update and store the returned settings.
    ///
    /// A failed update leaves the cache untouched.
    pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<SiteSettings, FetchError> {
        match self.inner.transport.update_settings(patch).await {
            Ok(settings) => {
                info!("Settings updated ({} keys)", settings.len());
                self.inner.settings.commit(settings.clone());
                Ok(settings)
            }
            Err(e) => {
                warn!("Settings update failed: {}", e);
                Err(e)
            }
        }
    }

    async fn fetch_settings(&self, mode: FetchMode) -> FetchOutcome {
        let transport = Arc::clone(&self.inner.transport);
        self.inner
            .settings
            .run_fetch(mode, move || async move { transport.fetch_settings().await })
            .await
    }
}

fn recompute_on_change<T: 'static>(weak: &Weak<Inner>) -> impl Fn(&T) + Send + Sync + 'static {
    let weak = weak.clone();
    move |_: &T| {
        if let Some(inner) = weak.upgrade() {
            inner.recompute();
        }
    }
}

impl std::fmt::Debug for ReadinessCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessCoordinator")
            .field("phase", &self.phase())
            .field("include_permissions", &self.includes_permissions())
            .field("settings", &self.inner.settings)
            .field("permissions", self.inner.watcher.cache())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::keys;
    use crate::permissions::Session;
    use crate::readiness::GuardError;
    use crate::transport::mock::{ScriptedTransport, grants, settings_json};
    use parking_lot::Mutex;
    use serde_json::json;

    fn coordinator(
        transport: &Arc<ScriptedTransport>,
        session: &Session,
        config: CoordinatorConfig,
    ) -> ReadinessCoordinator {
        let transport: Arc<dyn ResourceTransport> = transport.clone();
        let watcher = Arc::new(RoleWatcher::new(
            ResourceCache::new("permissions"),
            Arc::clone(&transport),
            session,
        ));
        ReadinessCoordinator::new(ResourceCache::new("settings"), watcher, transport, config)
    }

    fn record(
        coordinator: &ReadinessCoordinator,
    ) -> (Arc<Mutex<Vec<ReadinessPhase>>>, Subscription) {
        let phases = Arc::new(Mutex::new(vec![coordinator.phase()]));
        let log = Arc::clone(&phases);
        let sub = coordinator.subscribe(move |phase| log.lock().push(*phase));
        (phases, sub)
    }

    async fn until(cond: impl Fn() -> bool) {
        for _ in 0..1_000 {
            if cond() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition not reached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_start_becomes_ready() {
        let transport = ScriptedTransport::new();
        transport.push_settings_delayed(
            Ok(settings_json(json!({ "site_title": "Demo" }))),
            Duration::from_millis(200),
        );
        transport.push_permissions_delayed(
            Ok(grants(&[("view_site", true)])),
            Duration::from_millis(150),
        );
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::default());
        let (phases, _sub) = record(&coord);
        assert_eq!(coord.phase(), ReadinessPhase::Initializing);

        let task = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.load().await })
        };

        tokio::time::sleep(Duration::from_millis(175)).await;
        assert_eq!(coord.phase(), ReadinessPhase::Loading);
        assert!(coord.has_capability("view_site"));
        assert!(coord.settings().is_none());

        let report = task.await.unwrap();
        assert_eq!(report.settings, Some(FetchOutcome::Succeeded));
        assert_eq!(report.permissions, Some(FetchOutcome::Succeeded));
        assert_eq!(coord.phase(), ReadinessPhase::Ready);
        assert_eq!(coord.setting(&keys::SITE_TITLE), "Demo");
        assert_eq!(
            *phases.lock(),
            vec![
                ReadinessPhase::Initializing,
                ReadinessPhase::Loading,
                ReadinessPhase::Ready
            ]
        );
        assert_eq!(transport.permission_roles(), vec!["guest"]);
    }

    #[tokio::test]
    async fn test_settings_failure_then_retry() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Err("network error"));
        transport.push_permissions(Ok(grants(&[("view_site", true)])));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::default());

        coord.load().await;
        assert_eq!(coord.phase(), ReadinessPhase::Error);
        assert!(coord.settings().is_none());
        assert_eq!(coord.error().as_deref(), Some("network error"));

        transport.push_settings(Ok(settings_json(json!({ "site_title": "Back" }))));
        transport.push_permissions(Ok(grants(&[("view_site", true)])));
        let report = coord.retry().await;
        assert_eq!(report.settings, Some(FetchOutcome::Succeeded));
        assert_eq!(coord.phase(), ReadinessPhase::Ready);
        assert!(coord.error().is_none());
        assert_eq!(coord.setting(&keys::SITE_TITLE), "Back");
    }

    #[tokio::test]
    async fn test_loading_until_permissions_resolve() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({ "site_title": "Demo" }))));
        let gate = transport.push_permissions_gated(Ok(grants(&[("view_site", true)])));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::default());

        let task = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.load().await })
        };
        until(|| coord.settings().is_some() && coord.permissions_cache().is_loading()).await;

        assert!(coord.permissions().is_none());
        assert_eq!(coord.phase(), ReadinessPhase::Loading);

        gate.notify_one();
        task.await.unwrap();
        assert_eq!(coord.phase(), ReadinessPhase::Ready);
    }

    #[tokio::test]
    async fn test_partial_failure_and_settings_only_mode() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({}))));
        transport.push_permissions(Err("permissions unavailable"));
        let session = Session::new();
        let full = coordinator(&transport, &session, CoordinatorConfig::default());

        full.load().await;
        assert_eq!(full.phase(), ReadinessPhase::Error);
        assert_eq!(full.error().as_deref(), Some("permissions unavailable"));

        // Same caches, but only waiting on settings.
        let settings_only = ReadinessCoordinator::new(
            full.settings_cache().clone(),
            Arc::clone(full.watcher()),
            transport.clone(),
            CoordinatorConfig::settings_only(),
        );
        assert_eq!(settings_only.phase(), ReadinessPhase::Ready);
        assert!(settings_only.error().is_none());
        assert!(!settings_only.has_capability("view_site"));
    }

    #[tokio::test]
    async fn test_settings_only_never_fetches_permissions() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({ "theme": "blogwave" }))));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::settings_only());

        let report = coord.load().await;
        assert_eq!(report.permissions, None);
        assert_eq!(coord.phase(), ReadinessPhase::Ready);
        assert_eq!(transport.permission_calls(), 0);

        transport.push_settings(Ok(settings_json(json!({}))));
        let report = coord.refresh().await;
        assert_eq!(report.permissions, None);
        assert_eq!(transport.permission_calls(), 0);
    }

    #[tokio::test]
    async fn test_login_keeps_ready_and_old_capabilities() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({}))));
        transport.push_permissions(Ok(grants(&[("view_site", true)])));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::default());
        coord.load().await;

        session.login("1", "admin");
        let gate = transport
            .push_permissions_gated(Ok(grants(&[("view_site", true), ("add_posts", true)])));
        let task = {
            let watcher = Arc::clone(coord.watcher());
            tokio::spawn(async move { watcher.evaluate().await })
        };
        until(|| coord.permissions_cache().is_loading()).await;

        assert_eq!(coord.phase(), ReadinessPhase::Ready);
        assert!(coord.has_capability("view_site"));
        assert!(!coord.has_capability("add_posts"));

        gate.notify_one();
        task.await.unwrap();
        assert!(coord.has_capability("add_posts"));
        assert_eq!(coord.watcher().stored_role().as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let transport = ScriptedTransport::new();
        let gate = transport.push_settings_gated(Ok(settings_json(json!({}))));
        transport.push_permissions(Ok(grants(&[])));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::default());

        let first = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.load().await })
        };
        until(|| transport.settings_calls() == 1).await;

        let second = coord.load().await;
        assert_eq!(second.settings, Some(FetchOutcome::Skipped));

        gate.notify_one();
        first.await.unwrap();
        assert_eq!(transport.settings_calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_is_unconditional() {
        let transport = ScriptedTransport::new();
        let gate = transport.push_settings_gated(Ok(settings_json(json!({ "site_title": "A" }))));
        transport.push_settings(Ok(settings_json(json!({ "site_title": "B" }))));
        transport.push_permissions(Ok(grants(&[])));
        transport.push_permissions(Ok(grants(&[])));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::default());

        let first = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.refresh().await })
        };
        until(|| transport.settings_calls() == 1).await;

        let second = coord.refresh().await;
        assert_eq!(second.settings, Some(FetchOutcome::Succeeded));
        assert_eq!(transport.settings_calls(), 2);
        // First refresh still in flight.
        assert!(coord.settings_cache().is_loading());

        gate.notify_one();
        first.await.unwrap();
        assert!(!coord.settings_cache().is_loading());
        // Last write by completion order wins.
        assert_eq!(coord.setting(&keys::SITE_TITLE), "A");
    }

    #[tokio::test]
    async fn test_ensure_fresh_only_refetches_stale() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({}))));
        transport.push_permissions(Ok(grants(&[])));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::default());

        // Nothing fetched yet: everything is stale.
        let report = coord.ensure_fresh().await;
        assert_eq!(report.settings, Some(FetchOutcome::Succeeded));
        assert_eq!(report.permissions, Some(FetchOutcome::Succeeded));

        let report = coord.ensure_fresh().await;
        assert_eq!(report, RefreshReport::default());
        assert_eq!(transport.settings_calls(), 1);
        assert_eq!(transport.permission_calls(), 1);
    }

    #[tokio::test]
    async fn test_ensure_fresh_with_elapsed_ttl() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({}))));
        transport.push_settings(Ok(settings_json(json!({}))));
        let session = Session::new();
        let config = CoordinatorConfig::settings_only().stale_ttl(Duration::ZERO);
        let coord = coordinator(&transport, &session, config);

        coord.load().await;
        std::thread::sleep(Duration::from_millis(2));

        let report = coord.ensure_fresh().await;
        assert_eq!(report.settings, Some(FetchOutcome::Succeeded));
        assert_eq!(transport.settings_calls(), 2);
    }

    #[tokio::test]
    async fn test_update_settings_commits_on_success() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({ "site_title": "Old" }))));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::settings_only());
        coord.load().await;

        let patch = SettingsPatch::new()
            .set(&keys::SITE_TITLE, "New".to_string())
            .unwrap();

        transport.push_update(Err("forbidden"));
        let err = coord.update_settings(&patch).await.unwrap_err();
        assert_eq!(err.to_string(), "forbidden");
        assert_eq!(coord.setting(&keys::SITE_TITLE), "Old");
        assert!(coord.error().is_none());

        transport.push_update(Ok(settings_json(json!({ "site_title": "New" }))));
        let updated = coord.update_settings(&patch).await.unwrap();
        assert_eq!(updated.get(&keys::SITE_TITLE), "New");
        assert_eq!(coord.setting(&keys::SITE_TITLE), "New");
        assert_eq!(transport.update_calls(), 2);
        assert_eq!(coord.phase(), ReadinessPhase::Ready);
    }

    #[tokio::test]
    async fn test_error_reports_the_unresolved_resource() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({ "site_title": "Demo" }))));
        transport.push_permissions(Err("permissions down"));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::default());
        coord.load().await;

        // Settings keep their data through a failed revalidation.
        transport.push_settings(Err("settings revalidate failed"));
        transport.push_permissions(Err("permissions down"));
        coord.refresh().await;

        assert_eq!(
            coord.settings_cache().error().as_deref(),
            Some("settings revalidate failed")
        );
        assert_eq!(coord.setting(&keys::SITE_TITLE), "Demo");
        assert_eq!(coord.phase(), ReadinessPhase::Error);
        assert_eq!(coord.error().as_deref(), Some("permissions down"));

        let err = coord.block_until_ready().await.unwrap_err();
        assert_eq!(err, GuardError::Failed("permissions down".to_string()));

        // Without an unresolved failure, any recorded error is still reported.
        transport.push_permissions(Ok(grants(&[("view_site", true)])));
        coord.watcher().force_refresh().await;
        assert_eq!(coord.phase(), ReadinessPhase::Ready);
        assert_eq!(coord.error().as_deref(), Some("settings revalidate failed"));
    }

    #[tokio::test]
    async fn test_min_loading_duration_is_not_enforced() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({}))));
        transport.push_permissions(Ok(grants(&[])));
        let session = Session::new();
        let config = CoordinatorConfig::default().min_loading_duration(Duration::from_secs(10));
        let coord = coordinator(&transport, &session, config);

        let started = tokio::time::Instant::now();
        coord.load().await;

        // Stored and exposed, but the ready transition does not wait on it.
        assert_eq!(coord.min_loading_duration(), Duration::from_secs(10));
        assert_eq!(coord.phase(), ReadinessPhase::Ready);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_unsubscribed_listener_stops_receiving() {
        let transport = ScriptedTransport::new();
        transport.push_settings(Ok(settings_json(json!({}))));
        transport.push_permissions(Ok(grants(&[])));
        let session = Session::new();
        let coord = coordinator(&transport, &session, CoordinatorConfig::default());

        let (phases, sub) = record(&coord);
        sub.unsubscribe();
        coord.load().await;

        assert_eq!(*phases.lock(), vec![ReadinessPhase::Initializing]);
        assert_eq!(coord.phase(), ReadinessPhase::Ready);
    }
}
