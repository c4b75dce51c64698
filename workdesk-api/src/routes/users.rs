/// User endpoints
///
/// `GET /users` feeds the assignee picker on the task form. Admins and
/// managers only.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use workdesk_shared::{
    auth::context::AuthContext,
    models::user::UserSummary,
    services::users,
};

pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(users::list_assignable(&state.db, &ctx).await?))
}
