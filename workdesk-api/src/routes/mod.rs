/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, logout and the current user
/// - `tasks`: Task listing, editing and status changes
/// - `attachments`: Upload, download and deletion of task files
/// - `clients`: Client records
/// - `dashboard`: Role-dependent summary
/// - `users`: Assignee picker

pub mod attachments;
pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod health;
pub mod tasks;
pub mod users;
