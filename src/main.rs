//! Atrium - keeps site settings and role permissions loaded.
//!
//! Loads both resources, waits until they are ready, then revalidates them
//! whenever they go stale until interrupted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use atrium::cache::{FetchOutcome, ResourceCache};
use atrium::config::Config;
use atrium::models::keys;
use atrium::permissions::{GUEST_ROLE, Identity, RoleWatcher, Session};
use atrium::readiness::ReadinessCoordinator;
use atrium::transport::{HttpTransport, ResourceTransport};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("atrium=info,reqwest=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Atrium...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    let http = HttpTransport::from_config(&config)?;
    info!("API: {}", http.base_url());
    let transport: Arc<dyn ResourceTransport> = Arc::new(http);

    let session = match config.role.as_deref() {
        Some(role) if role != GUEST_ROLE => {
            info!("Starting session with role '{}'", role);
            Session::with_identity(Identity::Authenticated {
                user_id: "cli".to_string(),
                role: role.to_string(),
            })
        }
        _ => Session::new(),
    };

    let watcher = Arc::new(RoleWatcher::new(
        ResourceCache::new("permissions"),
        Arc::clone(&transport),
        &session,
    ));
    let coordinator = ReadinessCoordinator::new(
        ResourceCache::new("settings"),
        Arc::clone(&watcher),
        transport,
        config.coordinator_config(),
    );

    let _phase_log = coordinator.subscribe(|phase| info!("Readiness: {}", phase));

    if coordinator.includes_permissions() {
        watcher.spawn();
    }
    tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.load().await }
    });

    let ready = coordinator.block_until_ready().await?;
    info!("Site: {}", ready.settings.get(&keys::SITE_TITLE));
    info!("Theme: {}", ready.settings.get(&keys::THEME));
    if let Some(permissions) = &ready.permissions {
        info!(
            "Role '{}' capabilities: {:?}",
            permissions.role,
            permissions.granted().collect::<Vec<_>>()
        );
    }

    let mut interval = tokio::time::interval(config.stale_ttl.max(Duration::from_secs(1)));
    // First tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = coordinator.ensure_fresh().await;
                let outcomes = [("settings", report.settings), ("permissions", report.permissions)];
                for (name, outcome) in outcomes {
                    if let Some(FetchOutcome::Failed(e)) = outcome {
                        warn!("Revalidating {} failed: {}", name, e);
                    }
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
