//! # wishwall-server
//!
//! Backend for the wedding invitation guestbook.
//!
//! This binary provides:
//! - **REST API** (axum) for the public wish feed, submissions, likes and
//!   guest RSVPs
//! - **Moderation API** under `/admin`, guarded by the host token
//! - **Image storage** for wish photos, served back under `/storage`
//! - **Realtime channel** (server-sent events) pushing typed wish changes
//! - **Per-IP rate limiting** on the write routes

mod api;
mod auth;
mod config;
mod error;
mod image_store;
mod rate_limit;
mod realtime;
mod wishes;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use wishwall_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::image_store::ImageStore;
use crate::rate_limit::RateLimiter;
use crate::realtime::EventHub;
use crate::wishes::WishService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,wishwall_server=debug,wishwall_store=info")
            }),
        )
        .init();

    info!("Starting wishwall server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    if config.host_token.is_none() {
        tracing::warn!("HOST_TOKEN is not set, the moderation API is disabled");
    }

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)?;
    info!(path = %config.database_path.display(), "Database ready");

    let images = Arc::new(
        ImageStore::new(
            config.storage_path.clone(),
            &config.public_base_url,
            config.max_image_size,
        )
        .await?,
    );

    let rate_limiter = RateLimiter::from_config(&config);
    let http_addr = config.http_addr;

    let app_state = AppState {
        wishes: WishService::new(db, EventHub::new()),
        images,
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Every 5 minutes, forget clients idle for more than 10
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let purged = rate_limiter.purge_idle(Duration::from_secs(600)).await;
            if purged > 0 {
                tracing::debug!(purged, "Purged idle rate limit buckets");
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
