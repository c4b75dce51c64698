/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/login` - Exchange a username and password for a session token
/// - `POST /auth/logout` - Revoke the presented session
/// - `GET /auth/me` - The user behind the presented session

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::session::SessionToken,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use workdesk_shared::{
    auth::{context::AuthContext, session::authenticate},
    models::user::User,
    CoreError,
};

/// Login request
///
/// Blank and oversized fields are left to the authenticator so they fail
/// exactly like a wrong password.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,

    /// The authenticated user, without the password hash
    pub user: User,
}

/// Login endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "username": "l.chen", "password": "manager123" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username, wrong password, blank or oversized
///   fields (all indistinguishable)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let ctx = authenticate(&state.db, &req.username, &req.password).await?;

    let user = User::find_by_id(&state.db, ctx.user_id)
        .await
        .map_err(CoreError::from)?
        .ok_or(CoreError::AuthenticationFailed)?;

    let token = state.sessions.establish(&ctx)?;

    Ok(Json(LoginResponse { token, user }))
}

/// Logout endpoint
///
/// Revokes the session the request was made with. Always succeeds for a
/// request that got past the session middleware.
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> StatusCode {
    state.sessions.revoke(&token);
    tracing::info!(user_id = ctx.user_id, "User logged out");
    StatusCode::NO_CONTENT
}

/// Current user endpoint
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, ctx.user_id)
        .await
        .map_err(CoreError::from)?
        .ok_or_else(|| ApiError::Unauthorized("Session user no longer exists".to_string()))?;

    Ok(Json(user))
}
