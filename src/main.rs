//! Gabi - content backend for the Gabi Club website

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gabi::{
    api::{self, AppState},
    config::Config,
    db,
    services::{Notifier, TelegramNotifier},
};

/// Interval between session and rate limiter cleanups
const CLEANUP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gabi=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gabi backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Lead notifications
    let notifier: Option<Arc<dyn Notifier>> = match TelegramNotifier::from_config(&config.telegram)?
    {
        Some(notifier) => {
            tracing::info!("Telegram lead notifications enabled");
            Some(Arc::new(notifier))
        }
        None => {
            tracing::info!("Telegram lead notifications disabled");
            None
        }
    };

    // Build application state
    let state = AppState::new(pool.clone(), config.media.clone(), notifier);

    if state.user_service.bootstrap_admin(&config.admin).await?.is_some() {
        tracing::info!(username = %config.admin.username, "Bootstrap admin created");
    }

    // Periodic cleanup of expired sessions and rate limiter windows
    {
        let user_service = state.user_service.clone();
        let login_limiter = state.rate_limiter.clone();
        let lead_service = state.lead_service.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(CLEANUP_INTERVAL_SECS));
            loop {
                interval.tick().await;
                match user_service.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "Expired sessions removed"),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
                login_limiter.cleanup().await;
                lead_service.limiter().cleanup().await;
            }
        });
    }

    // Build router
    let app = api::build_app(state, &config.server);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    api::serve(listener, app).await?;

    pool.close().await;
    Ok(())
}
