//! # Workdesk Shared Library
//!
//! The access-control core of the Workdesk portal: who may read, create,
//! change or delete which tasks, clients and attachments, enforced the same
//! way for lists, detail reads and dashboard aggregates.
//!
//! ## Module Organization
//!
//! - `auth`: login, sessions, the permission policy and the task scope
//! - `db`: SQLite pool and migrations
//! - `models`: rows and their SQL
//! - `storage`: attachment blob store
//! - `services`: the operations callers use; each takes an `AuthContext`
//! - `error`: the `CoreError` taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{CoreError, CoreResult, FieldError};

/// Current version of the Workdesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
