//! Shared fixtures for integration tests
//!
//! Every test gets a private in-memory database with migrations applied and a
//! private blob store in a temporary directory. Users are inserted directly
//! with a placeholder hash so tests that do not log in skip Argon2 work.
#![allow(dead_code)]

use sqlx::SqlitePool;
use tempfile::TempDir;
use workdesk_shared::auth::context::AuthContext;
use workdesk_shared::db::migrations::run_migrations;
use workdesk_shared::db::pool::{create_pool, DatabaseConfig};
use workdesk_shared::models::user::{CreateUser, Role, User};
use workdesk_shared::services::tasks::{self, TaskInput};
use workdesk_shared::storage::LocalBlobStore;

pub struct TestEnv {
    pub pool: SqlitePool,
    pub store: LocalBlobStore,
    pub dir: TempDir,
    pub admin: AuthContext,
    pub finance_manager: AuthContext,
    pub staff_a: AuthContext,
    pub staff_b: AuthContext,
    pub marketing_staff: AuthContext,
}

pub async fn test_pool() -> SqlitePool {
    let pool = create_pool(DatabaseConfig::in_memory())
        .await
        .expect("Failed to create pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

pub async fn insert_user(pool: &SqlitePool, username: &str, role: Role, department: &str) -> AuthContext {
    let user = User::create(
        pool,
        CreateUser {
            username: username.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            full_name: format!("{} Person", username),
            email: format!("{}@mjlimited.co.uk", username),
            role,
            department: department.to_string(),
        },
    )
    .await
    .expect("Failed to insert user");

    AuthContext::from_user(&user)
}

pub async fn setup() -> TestEnv {
    let pool = test_pool().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = LocalBlobStore::new(dir.path().join("uploads"))
        .await
        .expect("Failed to create blob store");

    let admin = insert_user(&pool, "admin", Role::Admin, "Management & Strategy").await;
    let finance_manager = insert_user(&pool, "l.chen", Role::Manager, "Finance").await;
    let staff_a = insert_user(&pool, "e.williams", Role::Staff, "Finance").await;
    let staff_b = insert_user(&pool, "k.patel", Role::Staff, "Finance").await;
    let marketing_staff = insert_user(&pool, "s.green", Role::Staff, "Marketing").await;

    TestEnv {
        pool,
        store,
        dir,
        admin,
        finance_manager,
        staff_a,
        staff_b,
        marketing_staff,
    }
}

pub fn task_input(title: &str, department: &str, assignee: Option<i64>) -> TaskInput {
    TaskInput {
        title: title.to_string(),
        department: department.to_string(),
        assigned_to: assignee,
        ..Default::default()
    }
}

/// Creates a task as admin and returns its ID
pub async fn create_task(env: &TestEnv, title: &str, department: &str, assignee: Option<i64>) -> i64 {
    tasks::create(&env.pool, &env.admin, task_input(title, department, assignee))
        .await
        .expect("Failed to create task")
        .id
}
