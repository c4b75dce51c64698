/// Authentication and session lifecycle
///
/// - [`authenticate`] checks a handle and secret against the `users` table and
///   yields an [`AuthContext`]. Unknown handle, wrong secret, blank or oversized
///   input and an unusable stored hash all return the same [`CoreError::AuthenticationFailed`].
/// - [`SessionStore::establish`] binds a context to a new session and returns
///   the signed token for the transport; [`SessionStore::resolve`] maps a
///   presented token back to its context; [`SessionStore::revoke`] destroys the
///   session unconditionally.
///
/// The store is an in-process map guarded by a synchronous lock that is never
/// held across an `.await`. Each session is keyed by its own random id, so
/// concurrent sessions share nothing.
///
/// # Example
///
/// ```no_run
/// use workdesk_shared::auth::session::{authenticate, SessionStore};
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let sessions = SessionStore::new("a-secret-key-that-is-at-least-32-bytes!", 12);
///
/// let ctx = authenticate(&pool, "admin", "admin123").await?;
/// let token = sessions.establish(&ctx)?;
///
/// assert_eq!(sessions.resolve(&token)?, ctx);
/// sessions.revoke(&token);
/// assert!(sessions.resolve(&token).is_err());
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::context::AuthContext;
use super::jwt::{self, SessionClaims};
use super::password;
use crate::error::{CoreError, CoreResult};
use crate::models::user::{User, MAX_PASSWORD_LENGTH, MAX_USERNAME_LENGTH};

/// Verifies credentials and produces the actor context
///
/// # Errors
///
/// `AuthenticationFailed` for every credential problem; `Internal` only for
/// database faults.
pub async fn authenticate(pool: &SqlitePool, handle: &str, secret: &str) -> CoreResult<AuthContext> {
    let handle = handle.trim();
    if handle.is_empty()
        || secret.is_empty()
        || handle.chars().count() > MAX_USERNAME_LENGTH
        || secret.chars().count() > MAX_PASSWORD_LENGTH
    {
        return Err(CoreError::AuthenticationFailed);
    }

    let Some(user) = User::find_by_username(pool, handle).await? else {
        password::burn_verification(secret);
        warn!(handle = %handle, "Login failed");
        return Err(CoreError::AuthenticationFailed);
    };

    match password::verify_password(secret, &user.password_hash) {
        Ok(true) => {
            info!(user_id = user.id, role = user.role.as_str(), "Login succeeded");
            Ok(AuthContext::from_user(&user))
        }
        Ok(false) => {
            warn!(handle = %handle, "Login failed");
            Err(CoreError::AuthenticationFailed)
        }
        Err(e) => {
            tracing::error!(user_id = user.id, error = %e, "Stored credential unusable");
            Err(CoreError::AuthenticationFailed)
        }
    }
}

#[derive(Debug, Clone)]
struct SessionRecord {
    context: AuthContext,
    expires_at: DateTime<Utc>,
}

/// Server-side registry of live sessions
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionRecord>>,
    secret: String,
    ttl: Duration,
}

impl SessionStore {
    /// Creates an empty store signing tokens with `secret`
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Opens a session for the context and returns its token
    pub fn establish(&self, ctx: &AuthContext) -> CoreResult<String> {
        self.purge_expired();

        let session_id = Uuid::new_v4();
        let claims = SessionClaims::new(ctx.user_id, session_id, self.ttl);
        let token = jwt::create_token(&claims, &self.secret)
            .map_err(|e| CoreError::Internal(e.to_string()))?;

        let record = SessionRecord {
            context: ctx.clone(),
            expires_at: Utc::now() + self.ttl,
        };
        self.write().insert(session_id, record);

        debug!(user_id = ctx.user_id, session_id = %session_id, "Session established");
        Ok(token)
    }

    /// Maps a presented token to the context of its live session
    pub fn resolve(&self, token: &str) -> CoreResult<AuthContext> {
        let claims =
            jwt::validate_token(token, &self.secret).map_err(|_| CoreError::AuthenticationFailed)?;

        let record = self
            .read()
            .get(&claims.sid)
            .cloned()
            .ok_or(CoreError::AuthenticationFailed)?;

        if record.expires_at <= Utc::now() || record.context.user_id != claims.sub {
            self.write().remove(&claims.sid);
            return Err(CoreError::AuthenticationFailed);
        }

        Ok(record.context)
    }

    /// Destroys the session named by the token
    ///
    /// Unknown, expired or already revoked sessions are ignored.
    pub fn revoke(&self, token: &str) {
        match jwt::decode_ignoring_expiry(token, &self.secret) {
            Ok(claims) => {
                if self.write().remove(&claims.sid).is_some() {
                    debug!(user_id = claims.sub, session_id = %claims.sid, "Session revoked");
                }
            }
            Err(e) => debug!(error = %e, "Revoke called with unreadable token"),
        }
    }

    /// Number of sessions currently held
    pub fn active_sessions(&self) -> usize {
        self.read().len()
    }

    fn purge_expired(&self) {
        let now = Utc::now();
        self.write().retain(|_, record| record.expires_at > now);
    }

    // Poisoning leaves the map intact
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, SessionRecord>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, SessionRecord>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}
