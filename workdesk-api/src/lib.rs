//! # Workdesk API Server Library
//!
//! HTTP surface for the workdesk core: sessions, tasks, clients,
//! attachments, the dashboard and the assignee picker.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Session resolution and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
