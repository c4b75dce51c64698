/// Signed session tokens
///
/// The token handed to a client is an HS256 JWT whose `sid` claim names a
/// server-side session (see [`super::session::SessionStore`]). The signature
/// stops clients from forging session ids; the store is what makes a session
/// live, so revoking a session kills its token even before `exp`.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use uuid::Uuid;
/// use workdesk_shared::auth::jwt::{create_token, validate_token, SessionClaims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-key-that-is-at-least-32-bytes!";
/// let claims = SessionClaims::new(7, Uuid::new_v4(), Duration::hours(12));
/// let token = create_token(&claims, secret)?;
///
/// let decoded = validate_token(&token, secret)?;
/// assert_eq!(decoded.sub, 7);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim written into every token
pub const ISSUER: &str = "workdesk";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature, issuer or format rejected
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - user ID
    pub sub: i64,

    /// Session ID in the server-side store
    pub sid: Uuid,

    /// Issuer - always "workdesk"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl SessionClaims {
    pub fn new(user_id: i64, session_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            sid: session_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
        }
    }
}

/// Signs claims into a compact JWT
pub fn create_token(claims: &SessionClaims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Validates signature, issuer and expiry
pub fn validate_token(token: &str, secret: &str) -> Result<SessionClaims, JwtError> {
    decode_with(token, secret, true)
}

/// Validates signature and issuer but accepts expired tokens
///
/// Used on logout, where an expired token must still be able to name the
/// session it belonged to.
pub fn decode_ignoring_expiry(token: &str, secret: &str) -> Result<SessionClaims, JwtError> {
    decode_with(token, secret, false)
}

fn decode_with(token: &str, secret: &str, check_exp: bool) -> Result<SessionClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = check_exp;
    validation.validate_nbf = true;
    validation.leeway = 0;

    decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}
