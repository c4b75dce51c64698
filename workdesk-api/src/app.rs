/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use workdesk_api::{app::{build_router, AppState}, config::Config};
/// use workdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use workdesk_shared::storage::LocalBlobStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::from_url(
///     config.database.url.clone(),
///     config.database.max_connections,
/// ))
/// .await?;
/// let store = LocalBlobStore::new(config.uploads.folder.clone()).await?;
/// let app = build_router(AppState::new(pool, config, Arc::new(store)));
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{security::SecurityHeadersLayer, session::require_session},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use workdesk_shared::{auth::session::SessionStore, storage::BlobStore};

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Live sessions
    pub sessions: Arc<SessionStore>,

    /// Attachment blob storage
    pub store: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config, store: Arc<dyn BlobStore>) -> Self {
        let sessions = SessionStore::new(config.session.secret.clone(), config.session.ttl_hours);
        Self {
            db,
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            store,
        }
    }

    /// Largest accepted upload in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.config.uploads.max_bytes
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                          (public)
/// ├── POST /auth/login                      (public)
/// ├── POST /auth/logout
/// ├── GET  /auth/me
/// ├── GET|POST /tasks
/// ├── GET|PUT|DELETE /tasks/:id
/// ├── POST /tasks/:id/status
/// ├── GET|POST /tasks/:id/attachments
/// ├── GET  /attachments/:id/download
/// ├── GET  /attachments/download/:filename
/// ├── DELETE /attachments/:id
/// ├── GET|POST /clients
/// ├── GET|PUT|DELETE /clients/:id
/// ├── GET  /dashboard
/// └── GET  /users
/// ```
///
/// Everything except health and login sits behind the session middleware.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/login", post(routes::auth::login));

    let session_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/status", post(routes::tasks::update_task_status))
        .route(
            "/tasks/:id/attachments",
            get(routes::attachments::list_attachments).post(routes::attachments::upload_attachment),
        )
        .route(
            "/attachments/:id/download",
            get(routes::attachments::download_attachment),
        )
        .route(
            "/attachments/download/:filename",
            get(routes::attachments::download_by_filename),
        )
        .route(
            "/attachments/:id",
            axum::routing::delete(routes::attachments::delete_attachment),
        )
        .route(
            "/clients",
            get(routes::clients::list_clients).post(routes::clients::create_client),
        )
        .route(
            "/clients/:id",
            get(routes::clients::get_client)
                .put(routes::clients::update_client)
                .delete(routes::clients::delete_client),
        )
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route("/users", get(routes::users::list_users))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let body_limit = state.max_upload_bytes() + MULTIPART_OVERHEAD;

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
