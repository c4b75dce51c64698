/// Database layer for Workdesk
///
/// # Modules
///
/// - `pool`: SQLite connection pool management with health checks
/// - `migrations`: Database migration runner
/// - Models are in the `models` module at crate root level
///
/// # Example
///
/// ```no_run
/// use workdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::from_url(std::env::var("DATABASE_URL")?, 10)).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
