/// User model and database operations
///
/// Users are staff accounts. They are created at provisioning time and never
/// deleted through the core. There is deliberately no update path for `role`
/// or `department`: an actor cannot promote themselves.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     username TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     full_name TEXT NOT NULL,
///     email TEXT NOT NULL,
///     role TEXT NOT NULL CHECK (role IN ('admin', 'manager', 'staff')),
///     department TEXT NOT NULL,
///     created_at TIMESTAMP NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite};

/// The three built-in roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Whole organisation, including client deletion
    Admin,

    /// Administers tasks and clients, sees their own department's tasks
    Manager,

    /// Sees and updates the status of tasks assigned to them
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

/// User account row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    /// Login handle, always stored lower-case
    pub username: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub department: String,
    pub created_at: DateTime<Utc>,
}

/// Public projection used by assignee pickers and dashboards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub full_name: String,
    pub role: Role,
    pub department: String,
}

/// Input for inserting a user row
///
/// The hash must already be computed; see `services::users::provision`.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub department: String,
}

/// Lower-cases and trims a login handle
/// Longest username accepted at provisioning and login
pub const MAX_USERNAME_LENGTH: usize = 100;

/// Longest password accepted at provisioning and login
pub const MAX_PASSWORD_LENGTH: usize = 256;

pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the username is taken.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, full_name, email, role, department, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, username, password_hash, full_name, email, role, department, created_at
            "#,
        )
        .bind(normalize_username(&data.username))
        .bind(data.password_hash)
        .bind(data.full_name)
        .bind(data.email)
        .bind(data.role)
        .bind(data.department)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, email, role, department, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Finds a user by login handle (case-normalized before lookup)
    pub async fn find_by_username<'e, E>(
        executor: E,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, email, role, department, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(normalize_username(username))
        .fetch_optional(executor)
        .await
    }

    pub async fn exists<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(found.is_some())
    }

    /// Lists users ordered by display name, optionally limited to one department
    pub async fn list_summaries<'e, E>(
        executor: E,
        department: Option<&str>,
    ) -> Result<Vec<UserSummary>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, full_name, role, department
            FROM users
            WHERE (?1 IS NULL OR department = ?1)
            ORDER BY full_name ASC
            "#,
        )
        .bind(department)
        .fetch_all(executor)
        .await
    }

    pub async fn count<'e, E>(executor: E) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(executor)
            .await
    }
}
