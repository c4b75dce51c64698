//! Schema migrations
//!
//! The SQL files under `migrations/` at the workspace root are compiled into
//! the binary. They create `users`, `clients`, `tasks` and `attachments`
//! together with the check constraints on role, status and priority.
//!
//! ```no_run
//! use workdesk_shared::db::migrations::{get_migration_status, run_migrations};
//! use workdesk_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::from_url("sqlite://workdesk.db", 10)).await?;
//! run_migrations(&pool).await?;
//!
//! let status = get_migration_status(&pool).await?;
//! assert!(status.is_up_to_date);
//! # Ok(())
//! # }
//! ```

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, error, info};

static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applied versus embedded migrations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied_migrations: usize,
    pub latest_version: Option<i64>,
    pub is_up_to_date: bool,
}

/// Applies every embedded migration not yet recorded in `_sqlx_migrations`
///
/// Safe to call on every start-up.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    let embedded = MIGRATOR.iter().count();
    info!(embedded, "Applying schema migrations");

    MIGRATOR.run(pool).await.inspect_err(|e| {
        error!(error = %e, "Schema migration failed");
    })?;

    debug!("Schema is current");
    Ok(())
}

/// Reports how far the database schema has been migrated
///
/// A database that has never been migrated reports zero applied migrations.
pub async fn get_migration_status(pool: &SqlitePool) -> Result<MigrationStatus, sqlx::Error> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    let (applied, latest_version) = if tracked == 0 {
        (0, None)
    } else {
        let (count, latest): (i64, Option<i64>) = sqlx::query_as(
            "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(pool)
        .await?;
        (count.max(0) as usize, latest)
    };

    let embedded = MIGRATOR.iter().count();
    Ok(MigrationStatus {
        applied_migrations: applied,
        latest_version,
        is_up_to_date: applied > 0 && applied >= embedded,
    })
}
