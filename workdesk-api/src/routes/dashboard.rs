/// Dashboard endpoint
///
/// `GET /dashboard` returns task counts and breakdowns restricted to what the
/// caller can see. Admins and managers also get client totals and a workload
/// table; admins additionally get staff and department figures.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use workdesk_shared::{
    auth::context::AuthContext,
    services::dashboard::{self, DashboardSummary},
};

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(dashboard::summary(&state.db, &ctx).await?))
}
