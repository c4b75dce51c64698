//! SQLite connection pool
//!
//! Every connection is opened with foreign keys switched on, so the
//! attachment cascade and the task references to users and clients are
//! enforced by the store itself. File databases run in WAL mode with a busy
//! timeout, letting readers proceed while a delete transaction is open.
//!
//! # Example
//!
//! ```no_run
//! use workdesk_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), sqlx::Error> {
//! let pool = create_pool(DatabaseConfig::from_url("sqlite://workdesk.db", 10)).await?;
//!
//! let open: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status = 'open'")
//!     .fetch_one(&pool)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pool settings; durations are whole seconds so they map onto env vars
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite://path/to/file.db` or `sqlite::memory:`
    pub url: String,

    /// Upper bound on open connections (default 10)
    ///
    /// An in-memory database must use 1; each connection would otherwise
    /// open its own empty database.
    pub max_connections: u32,

    pub min_connections: u32,

    /// How long a caller waits for a free connection (default 30)
    pub acquire_timeout_seconds: u64,

    /// How long SQLite retries a locked database before failing (default 5)
    pub busy_timeout_seconds: u64,

    /// Idle connections are closed after this long; `None` keeps them
    pub idle_timeout_seconds: Option<u64>,

    /// Connections are recycled after this long; `None` keeps them
    pub max_lifetime_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            busy_timeout_seconds: 5,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

impl DatabaseConfig {
    /// Defaults with the given URL and pool size
    pub fn from_url(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections,
            ..Default::default()
        }
    }

    /// A private in-memory database
    ///
    /// One connection that is never recycled, so the data lives exactly as
    /// long as the pool. Used by tests and throwaway tooling.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout_seconds: None,
            max_lifetime_seconds: None,
            ..Default::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Opens the pool and verifies the database answers
///
/// A missing database file is created.
///
/// # Errors
///
/// Fails on a malformed URL, an unopenable file, or a failed health check.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = config.is_in_memory();
    info!(
        max_connections = config.max_connections,
        in_memory,
        "Opening SQLite pool"
    );

    let mut connect_options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_seconds));
    if !in_memory {
        connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(config.idle_timeout_seconds.map(Duration::from_secs))
        .max_lifetime(config.max_lifetime_seconds.map(Duration::from_secs))
        .connect_with(connect_options)
        .await?;

    health_check(&pool).await?;

    debug!("SQLite pool ready");
    Ok(pool)
}

/// Runs `SELECT 1` against the pool
pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let answer: i64 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if answer != 1 {
        warn!(answer, "Health check returned an unexpected value");
        return Err(sqlx::Error::Protocol(format!(
            "health check returned {}",
            answer
        )));
    }
    Ok(())
}

/// Snapshot of pool usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub active_connections: usize,
    pub idle_connections: usize,
    pub total_connections: usize,
}

pub fn get_pool_stats(pool: &SqlitePool) -> PoolStats {
    let total = pool.size() as usize;
    let idle = pool.num_idle();

    PoolStats {
        active_connections: total.saturating_sub(idle),
        idle_connections: idle,
        total_connections: total,
    }
}

/// Closes every connection; SQLite checkpoints the WAL on the last close
pub async fn close_pool(pool: SqlitePool) {
    pool.close().await;
    info!("SQLite pool closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_keeps_defaults() {
        let config = DatabaseConfig::from_url("sqlite://workdesk.db", 4);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.acquire_timeout_seconds, 30);
        assert_eq!(config.busy_timeout_seconds, 5);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_in_memory_config_never_recycles() {
        let config = DatabaseConfig::in_memory();
        assert_eq!(config.max_connections, 1);
        assert!(config.is_in_memory());
        assert!(config.idle_timeout_seconds.is_none());
        assert!(config.max_lifetime_seconds.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_pool_health() {
        let pool = create_pool(DatabaseConfig::in_memory()).await.unwrap();
        health_check(&pool).await.unwrap();

        let stats = get_pool_stats(&pool);
        assert_eq!(stats.total_connections, 1);

        close_pool(pool).await;
    }
}
