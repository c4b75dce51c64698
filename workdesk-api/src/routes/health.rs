/// Liveness probe
///
/// `GET /health` needs no session. It reports whether SQLite answers, whether
/// the schema is fully migrated, and how many sessions are live.
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "database": "connected",
///   "schema_current": true, "active_sessions": 3 }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use workdesk_shared::db::{migrations, pool};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub schema_current: bool,
    pub active_sessions: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = pool::health_check(&state.db).await.is_ok();
    let schema_current = connected
        && migrations::get_migration_status(&state.db)
            .await
            .map(|status| status.is_up_to_date)
            .unwrap_or(false);

    Json(HealthResponse {
        status: if connected && schema_current { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if connected { "connected" } else { "disconnected" },
        schema_current,
        active_sessions: state.sessions.active_sessions(),
    })
}
