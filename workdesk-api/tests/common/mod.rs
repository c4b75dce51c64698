//! Common test utilities for API integration tests
//!
//! Each test gets its own in-memory database, a temporary upload directory
//! and a router built exactly as the server builds it. The seeded users log in
//! through the real `/auth/login` endpoint.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;
use workdesk_api::app::{build_router, AppState};
use workdesk_api::config::{ApiConfig, Config, DatabaseConfig, SessionConfig, UploadConfig};
use workdesk_shared::db::migrations::run_migrations;
use workdesk_shared::db::pool::{self, create_pool};
use workdesk_shared::models::user::Role;
use workdesk_shared::services::attachments::DEFAULT_MAX_UPLOAD_BYTES;
use workdesk_shared::services::users::{self, NewUser};
use workdesk_shared::storage::LocalBlobStore;

pub const BOUNDARY: &str = "workdesk-test-boundary";

/// Seeded accounts: (username, password, role, department)
pub const ACCOUNTS: [(&str, &str, Role, &str); 5] = [
    ("admin", "admin123", Role::Admin, "Management & Strategy"),
    ("l.chen", "manager123", Role::Manager, "Finance"),
    ("e.williams", "staff123", Role::Staff, "Finance"),
    ("k.patel", "staff123", Role::Staff, "Finance"),
    ("s.green", "staff123", Role::Staff, "Marketing"),
];

pub struct TestContext {
    pub app: Router,
    pub db: SqlitePool,
    pub store: LocalBlobStore,
    pub dir: TempDir,
}

pub fn test_config(upload_folder: PathBuf, max_bytes: usize) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        session: SessionConfig {
            secret: "api-test-secret-key-at-least-32-bytes".to_string(),
            ttl_hours: 12,
        },
        uploads: UploadConfig {
            folder: upload_folder,
            max_bytes,
        },
    }
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_max_upload(DEFAULT_MAX_UPLOAD_BYTES).await
    }

    pub async fn with_max_upload(max_bytes: usize) -> Self {
        let db = create_pool(pool::DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&db).await.unwrap();

        for (username, password, role, department) in ACCOUNTS {
            users::provision(
                &db,
                NewUser {
                    username: username.to_string(),
                    password: password.to_string(),
                    full_name: format!("{} Person", username),
                    email: format!("{}@mjlimited.co.uk", username),
                    role,
                    department: department.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("uploads");
        let store = LocalBlobStore::new(folder.clone()).await.unwrap();

        let state = AppState::new(
            db.clone(),
            test_config(folder, max_bytes),
            Arc::new(store.clone()),
        );

        Self {
            app: build_router(state),
            db,
            store,
            dir,
        }
    }

    /// Sends a request and returns the status with the JSON body
    /// (`Value::Null` for empty or non-JSON bodies)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn login(&self, username: &str) -> String {
        let password = ACCOUNTS
            .iter()
            .find(|(name, ..)| *name == username)
            .map(|(_, password, ..)| *password)
            .unwrap();

        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/auth/login",
                None,
                serde_json::json!({ "username": username, "password": password }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed for {}: {}", username, body);

        body["token"].as_str().unwrap().to_string()
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.db)
            .await
            .unwrap()
    }

    /// Creates a task as the admin and returns its ID
    pub async fn create_task(&self, title: &str, department: &str, assignee: Option<&str>) -> i64 {
        let admin = self.login("admin").await;
        let assigned_to = match assignee {
            Some(username) => Some(self.user_id(username).await),
            None => None,
        };

        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/tasks",
                Some(&admin),
                serde_json::json!({
                    "title": title,
                    "department": department,
                    "assigned_to": assigned_to,
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        body["id"].as_i64().unwrap()
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn multipart_body(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(task_id: i64, token: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let body = multipart_body(filename, content);
    Request::builder()
        .method(Method::POST)
        .uri(format!("/tasks/{}/attachments", task_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}
