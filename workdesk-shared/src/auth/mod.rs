/// Identity, sessions and access control
///
/// # Modules
///
/// - [`password`]: Argon2id credential hashing and verification
/// - [`jwt`]: signed session tokens
/// - [`session`]: login and the server-side session store
/// - [`context`]: the per-operation actor context
/// - [`policy`]: the role-based permission table
/// - [`scope`]: the row-visibility predicate for task queries
///
/// # Example
///
/// ```no_run
/// use workdesk_shared::auth::context::AuthContext;
/// use workdesk_shared::auth::policy::{authorize, Action};
/// use workdesk_shared::models::user::Role;
///
/// let ctx = AuthContext::new(3, "k.patel", Role::Staff, "Finance");
/// assert!(authorize(&ctx, Action::UploadAttachment).is_ok());
/// assert!(authorize(&ctx, Action::DeleteTask).is_err());
/// ```

pub mod context;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod scope;
pub mod session;
