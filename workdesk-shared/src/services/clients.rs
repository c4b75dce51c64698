/// Client lifecycle
///
/// Admins and managers list, view, create and edit clients; only admins
/// delete them, and only while no task references the client.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::{Validate, ValidateEmail};

use crate::auth::context::AuthContext;
use crate::auth::policy::{authorize, Action};
use crate::error::{CoreError, CoreResult, FieldError};
use crate::models::client::{Client, ClientFields, ClientFilter, ClientStatus};
use crate::models::task::Task;

use super::{length_errors, optional, required};

/// Raw client fields as submitted by a caller
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ClientInput {
    #[validate(length(max = 200, message = "Company name must be at most 200 characters"))]
    pub company_name: String,

    #[validate(length(max = 100, message = "Contact name must be at most 100 characters"))]
    pub contact_name: String,

    #[validate(length(max = 254, message = "Contact email must be at most 254 characters"))]
    pub contact_email: String,

    #[validate(length(max = 50, message = "Contact phone must be at most 50 characters"))]
    pub contact_phone: Option<String>,

    #[validate(length(max = 100, message = "Industry must be at most 100 characters"))]
    pub industry: Option<String>,

    /// `active` (default) or `inactive`
    pub status: Option<String>,

    #[validate(length(max = 5000, message = "Notes must be at most 5000 characters"))]
    pub notes: Option<String>,
}

fn validate(input: ClientInput) -> CoreResult<ClientFields> {
    let mut errors = length_errors(&input);

    let company_name = required(&mut errors, "company_name", "Company name", &input.company_name);
    let contact_name = required(&mut errors, "contact_name", "Contact name", &input.contact_name);
    let contact_email =
        required(&mut errors, "contact_email", "Contact email", &input.contact_email);

    if !contact_email.is_empty() && !contact_email.validate_email() {
        errors.push(FieldError::new("contact_email", "Contact email is not a valid address"));
    }

    let status = match optional(input.status) {
        None => ClientStatus::default(),
        Some(raw) => ClientStatus::parse(&raw).unwrap_or_else(|| {
            errors.push(FieldError::new("status", "Status must be 'active' or 'inactive'"));
            ClientStatus::default()
        }),
    };

    if !errors.is_empty() {
        return Err(CoreError::ValidationFailed(errors));
    }

    Ok(ClientFields {
        company_name,
        contact_name,
        contact_email,
        contact_phone: optional(input.contact_phone),
        industry: optional(input.industry),
        status,
        notes: optional(input.notes),
    })
}

pub async fn create(pool: &SqlitePool, ctx: &AuthContext, input: ClientInput) -> CoreResult<Client> {
    authorize(ctx, Action::CreateClient)?;

    let client = Client::create(pool, validate(input)?).await?;

    info!(client_id = client.id, user_id = ctx.user_id, "Client created");
    Ok(client)
}

pub async fn get(pool: &SqlitePool, ctx: &AuthContext, id: i64) -> CoreResult<Client> {
    authorize(ctx, Action::ViewClient)?;

    Client::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound("Client"))
}

pub async fn list(
    pool: &SqlitePool,
    ctx: &AuthContext,
    filter: &ClientFilter,
) -> CoreResult<Vec<Client>> {
    authorize(ctx, Action::ListClients)?;

    Ok(Client::list(pool, filter).await?)
}

pub async fn update(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: i64,
    input: ClientInput,
) -> CoreResult<Client> {
    authorize(ctx, Action::EditClient)?;

    let fields = validate(input)?;
    let client = Client::update(pool, id, fields)
        .await?
        .ok_or(CoreError::NotFound("Client"))?;

    info!(client_id = id, user_id = ctx.user_id, "Client updated");
    Ok(client)
}

/// Deletes a client with no linked tasks
///
/// # Errors
///
/// `Conflict` naming the number of linked tasks when any task references the
/// client; nothing is changed in that case.
pub async fn delete(pool: &SqlitePool, ctx: &AuthContext, id: i64) -> CoreResult<()> {
    authorize(ctx, Action::DeleteClient)?;

    let mut tx = pool.begin().await?;

    if Client::find_by_id(&mut *tx, id).await?.is_none() {
        return Err(CoreError::NotFound("Client"));
    }

    let linked = Task::count_by_client(&mut *tx, id).await?;
    if linked > 0 {
        warn!(client_id = id, linked, "Client delete blocked by linked tasks");
        return Err(CoreError::Conflict(format!(
            "Cannot delete client with {} linked task(s)",
            linked
        )));
    }

    Client::delete(&mut *tx, id).await?;
    tx.commit().await?;

    info!(client_id = id, user_id = ctx.user_id, "Client deleted");
    Ok(())
}
