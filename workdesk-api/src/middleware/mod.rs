/// Middleware modules for the API server
///
/// - `session`: resolves bearer session tokens into an `AuthContext`
/// - `security`: security response headers

pub mod security;
pub mod session;
