/// Bearer session middleware
///
/// Reads `Authorization: Bearer <token>`, resolves the token against the
/// session store and injects the resulting [`AuthContext`] (and the raw token,
/// for logout) into request extensions. Requests without a live session are
/// rejected with 401 before reaching a handler.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use workdesk_shared::auth::context::AuthContext;

use crate::{app::AppState, error::ApiError};

/// The token a request was authenticated with
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

fn bearer_token(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))
}

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req)?.to_string();

    let ctx: AuthContext = state
        .sessions
        .resolve(&token)
        .map_err(|_| ApiError::Unauthorized("Session expired or invalid".to_string()))?;

    req.extensions_mut().insert(ctx);
    req.extensions_mut().insert(SessionToken(token));

    Ok(next.run(req).await)
}
