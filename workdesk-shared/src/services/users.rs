/// User provisioning and the assignee picker
///
/// Provisioning is an operator action (seed binary, tests) and takes no actor
/// context. There is no update path, so role and department stay as
/// provisioned.

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use validator::ValidateEmail;

use crate::auth::context::AuthContext;
use crate::auth::password::hash_password;
use crate::auth::policy::{authorize, Action};
use crate::error::{CoreError, CoreResult, FieldError};
use crate::models::user::{
    normalize_username, CreateUser, User, UserSummary, MAX_PASSWORD_LENGTH, MAX_USERNAME_LENGTH,
};
use crate::models::Role;

use super::required;

/// Minimum accepted password length at provisioning time
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub department: String,
}

fn validate(user: &NewUser) -> CoreResult<(String, String, String, String)> {
    let mut errors: Vec<FieldError> = Vec::new();

    let username = normalize_username(&required(&mut errors, "username", "Username", &user.username));
    let full_name = required(&mut errors, "full_name", "Full name", &user.full_name);
    let email = required(&mut errors, "email", "Email", &user.email);
    let department = required(&mut errors, "department", "Department", &user.department);

    if !email.is_empty() && !email.validate_email() {
        errors.push(FieldError::new("email", "Email is not a valid address"));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        errors.push(FieldError::new(
            "username",
            format!("Username must be at most {} characters", MAX_USERNAME_LENGTH),
        ));
    }

    let password_length = user.password.chars().count();
    if password_length < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    } else if password_length > MAX_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at most {} characters", MAX_PASSWORD_LENGTH),
        ));
    }

    if errors.is_empty() {
        Ok((username, full_name, email, department))
    } else {
        Err(CoreError::ValidationFailed(errors))
    }
}

/// Creates a user with an Argon2id-hashed password
///
/// # Errors
///
/// `Conflict` if the (normalized) username is already taken.
pub async fn provision(pool: &SqlitePool, user: NewUser) -> CoreResult<User> {
    let (username, full_name, email, department) = validate(&user)?;

    if User::find_by_username(pool, &username).await?.is_some() {
        return Err(CoreError::Conflict("Username already exists".to_string()));
    }

    let password_hash = hash_password(&user.password)?;
    let created = User::create(
        pool,
        CreateUser {
            username,
            password_hash,
            full_name,
            email,
            role: user.role,
            department,
        },
    )
    .await?;

    info!(
        user_id = created.id,
        role = created.role.as_str(),
        department = %created.department,
        "User provisioned"
    );
    Ok(created)
}

/// Users a task may be assigned to, ordered by name
pub async fn list_assignable(pool: &SqlitePool, ctx: &AuthContext) -> CoreResult<Vec<UserSummary>> {
    authorize(ctx, Action::ListUsers)?;

    Ok(User::list_summaries(pool, None).await?)
}
