//! Authentication ports.

/// Identity carried by a validated session token.
#[derive(Debug, Clone)]
pub struct SessionClaims {
    pub user_id: i32,
    pub email: String,
    /// Seconds since the epoch at which the token was issued.
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Token service trait for session and verification tokens.
///
/// Session tokens authenticate requests and double as magic-login tokens
/// delivered by email. Verification tokens are a distinct, shorter-lived
/// shape that only encodes the user id; the two are never interchangeable.
pub trait TokenService: Send + Sync {
    /// Issue a session token for a user.
    fn issue(&self, user_id: i32, email: &str) -> Result<String, AuthError>;

    /// Validate and decode a session token.
    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError>;

    /// Issue a fresh session token from a still-refreshable old one.
    ///
    /// The old token may be past its expiry, but must be older than the
    /// early-refresh floor and younger than the refresh lifespan.
    fn refresh(&self, token: &str) -> Result<String, AuthError>;

    /// Issue an email-verification token encoding the user id.
    fn issue_verification(&self, user_id: i32) -> Result<String, AuthError>;

    /// Validate a verification token, returning the encoded user id.
    fn verify_verification(&self, token: &str) -> Result<i32, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a stored hash.
    ///
    /// An unparsable stored hash (e.g. the sentinel account's disabled `!`
    /// credential) is a non-match, not an error.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token is too recent to refresh")]
    RefreshTooEarly,

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    HashingError(String),
}
