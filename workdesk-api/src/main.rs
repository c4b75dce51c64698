//! # Workdesk API Server
//!
//! Serves the work-tracking portal API: role-scoped tasks, client records,
//! task attachments and the dashboard.
//!
//! ## Usage
//!
//! ```bash
//! SESSION_SECRET=$(openssl rand -hex 32) cargo run -p workdesk-api
//! LOG_FORMAT=json SESSION_SECRET=... cargo run -p workdesk-api
//! ```

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use workdesk_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    storage::LocalBlobStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // LOG_FORMAT=json switches to one JSON object per line
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "workdesk_api=debug,workdesk_shared=debug,tower_http=debug".into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Workdesk API v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let pool = create_pool(DatabaseConfig::from_url(
        config.database.url.clone(),
        config.database.max_connections,
    ))
    .await?;
    run_migrations(&pool).await?;

    let store = LocalBlobStore::new(config.uploads.folder.clone()).await?;
    tracing::info!(root = %store.root().display(), "Attachment storage ready");

    let app = build_router(AppState::new(pool.clone(), config, Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
