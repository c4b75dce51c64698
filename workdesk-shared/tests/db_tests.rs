//! Integration tests for the connection pool and migrations
///
/// Run against private in-memory databases; no external services needed.

mod common;

use workdesk_shared::db::migrations::{get_migration_status, run_migrations};
use workdesk_shared::db::pool::{close_pool, create_pool, get_pool_stats, health_check, DatabaseConfig};

#[tokio::test]
async fn test_in_memory_pool_is_healthy() {
    let pool = create_pool(DatabaseConfig::in_memory())
        .await
        .expect("Failed to create pool");

    assert!(health_check(&pool).await.is_ok());
    assert_eq!(get_pool_stats(&pool).total_connections, 1);

    close_pool(pool).await;
}

#[tokio::test]
async fn test_file_database_created_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workdesk.db");
    let config = DatabaseConfig::from_url(format!("sqlite://{}", path.display()), 2);

    let pool = create_pool(config).await.expect("Failed to create pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    close_pool(pool).await;

    assert!(path.exists());
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let pool = common::test_pool().await;

    run_migrations(&pool).await.expect("Second run should be a no-op");

    let status = get_migration_status(&pool).await.unwrap();
    assert!(status.is_up_to_date);
    assert_eq!(status.applied_migrations, 1);
}

#[tokio::test]
async fn test_schema_has_core_tables() {
    let pool = common::test_pool().await;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'clients', 'tasks', 'attachments') ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(tables, vec!["attachments", "clients", "tasks", "users"]);
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let pool = common::test_pool().await;

    let result = sqlx::query(
        "INSERT INTO tasks (title, status, priority, department, created_by, created_at, updated_at) \
         VALUES ('Orphan', 'open', 'medium', 'Finance', 999, '2025-01-01', '2025-01-01')",
    )
    .execute(&pool)
    .await;

    let err = result.expect_err("Insert referencing a missing user must fail");
    let db_err = err.as_database_error().expect("Expected a database error");
    assert!(db_err.is_foreign_key_violation());
}

#[tokio::test]
async fn test_status_check_constraint() {
    let env = common::setup().await;

    let result = sqlx::query(
        "INSERT INTO tasks (title, status, priority, department, created_by, created_at, updated_at) \
         VALUES ('Bad', 'done', 'medium', 'Finance', ?, '2025-01-01', '2025-01-01')",
    )
    .bind(env.admin.user_id)
    .execute(&env.pool)
    .await;

    let err: workdesk_shared::CoreError = result.unwrap_err().into();
    assert!(matches!(err, workdesk_shared::CoreError::ValidationFailed(_)));
}
