/// Client model and database operations
///
/// Clients are external companies tasks can be linked to. There is no soft
/// delete: a client is retired by setting its status to `inactive`, and a
/// hard delete is only allowed once no task references it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE clients (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     company_name TEXT NOT NULL,
///     contact_name TEXT NOT NULL,
///     contact_email TEXT NOT NULL,
///     contact_phone TEXT,
///     industry TEXT,
///     status TEXT NOT NULL CHECK (status IN ('active', 'inactive')),
///     notes TEXT,
///     created_at TIMESTAMP NOT NULL,
///     updated_at TIMESTAMP NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, QueryBuilder, Sqlite};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ClientStatus::Active),
            "inactive" => Some(ClientStatus::Inactive),
            _ => None,
        }
    }
}

/// Client row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: i64,
    pub company_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub industry: Option<String>,
    pub status: ClientStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated field values for insert and full update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFields {
    pub company_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub industry: Option<String>,
    pub status: ClientStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFilter {
    pub status: Option<ClientStatus>,
    pub industry: Option<String>,

    /// Substring matched against company, contact name and contact email
    pub search: Option<String>,
}

impl Client {
    pub async fn create<'e, E>(executor: E, data: ClientFields) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (company_name, contact_name, contact_email, contact_phone,
                                 industry, status, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, company_name, contact_name, contact_email, contact_phone,
                      industry, status, notes, created_at, updated_at
            "#,
        )
        .bind(data.company_name)
        .bind(data.contact_name)
        .bind(data.contact_email)
        .bind(data.contact_phone)
        .bind(data.industry)
        .bind(data.status)
        .bind(data.notes)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Client>(
            r#"
            SELECT id, company_name, contact_name, contact_email, contact_phone,
                   industry, status, notes, created_at, updated_at
            FROM clients
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn exists<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(found.is_some())
    }

    /// Lists clients ordered by company name
    pub async fn list<'e, E>(executor: E, filter: &ClientFilter) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, company_name, contact_name, contact_email, contact_phone, \
             industry, status, notes, created_at, updated_at \
             FROM clients WHERE 1=1",
        );

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(industry) = filter.industry.as_deref().map(str::trim) {
            if !industry.is_empty() {
                qb.push(" AND industry = ").push_bind(industry.to_string());
            }
        }
        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let pattern = format!("%{}%", search);
                qb.push(" AND (company_name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR contact_name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR contact_email LIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        qb.push(" ORDER BY company_name ASC, id ASC");

        qb.build_query_as::<Client>().fetch_all(executor).await
    }

    pub async fn update<'e, E>(
        executor: E,
        id: i64,
        data: ClientFields,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET company_name = ?, contact_name = ?, contact_email = ?, contact_phone = ?,
                industry = ?, status = ?, notes = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, company_name, contact_name, contact_email, contact_phone,
                      industry, status, notes, created_at, updated_at
            "#,
        )
        .bind(data.company_name)
        .bind(data.contact_name)
        .bind(data.contact_email)
        .bind(data.contact_phone)
        .bind(data.industry)
        .bind(data.status)
        .bind(data.notes)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns `(total, active)` client counts
    pub async fn counts<'e, E>(executor: E) -> Result<(i64, i64), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) FROM clients",
        )
        .fetch_one(executor)
        .await
    }
}
