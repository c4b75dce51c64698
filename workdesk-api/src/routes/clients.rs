/// Client endpoints
///
/// Admins and managers only; staff receive 403 on every route. Deleting is
/// admin-only and refused with 409 while tasks still reference the client.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use workdesk_shared::{
    auth::context::AuthContext,
    models::client::{Client, ClientFilter, ClientStatus},
    services::clients::{self, ClientInput},
    CoreError,
};

/// Query string accepted by `GET /clients`
#[derive(Debug, Default, Deserialize)]
pub struct ClientListQuery {
    pub status: Option<String>,
    pub industry: Option<String>,
    pub search: Option<String>,
}

impl ClientListQuery {
    fn into_filter(self) -> Result<ClientFilter, CoreError> {
        let blank_to_none = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        let status = match blank_to_none(self.status) {
            None => None,
            Some(raw) => Some(ClientStatus::parse(&raw).ok_or_else(|| {
                CoreError::invalid("status", "Status must be 'active' or 'inactive'")
            })?),
        };

        Ok(ClientFilter {
            status,
            industry: blank_to_none(self.industry),
            search: blank_to_none(self.search),
        })
    }
}

pub async fn list_clients(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ClientListQuery>,
) -> ApiResult<Json<Vec<Client>>> {
    let filter = query.into_filter()?;
    Ok(Json(clients::list(&state.db, &ctx, &filter).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<ClientInput>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let client = clients::create(&state.db, &ctx, input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Client>> {
    Ok(Json(clients::get(&state.db, &ctx, id).await?))
}

pub async fn update_client(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(input): Json<ClientInput>,
) -> ApiResult<Json<Client>> {
    Ok(Json(clients::update(&state.db, &ctx, id, input).await?))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    clients::delete(&state.db, &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_query_filters() {
        let filter = ClientListQuery {
            status: Some("inactive".to_string()),
            industry: Some(" ".to_string()),
            search: Some("west".to_string()),
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.status, Some(ClientStatus::Inactive));
        assert_eq!(filter.industry, None);
        assert_eq!(filter.search.as_deref(), Some("west"));

        let bad = ClientListQuery {
            status: Some("dormant".to_string()),
            ..Default::default()
        };
        assert!(bad.into_filter().is_err());
    }
}
