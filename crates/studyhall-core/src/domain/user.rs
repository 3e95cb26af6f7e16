use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Inclusive password length bounds enforced at registration and password change.
pub const PASSWORD_MIN_LEN: usize = 10;
pub const PASSWORD_MAX_LEN: usize = 32;

/// User entity - an account on the forum.
///
/// Lifecycle: created unverified at registration, flipped to verified by
/// token exchange, removed by the asynchronous deletion job. The sentinel
/// "deleted account" user is a regular row that stays unverified forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
}

/// Payload for inserting a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// Reject passwords outside the allowed length range.
pub fn validate_password(password: &str) -> Result<(), DomainError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN || len > PASSWORD_MAX_LEN {
        return Err(DomainError::validation(format!(
            "Invalid password: must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Reject addresses outside the institutional domain.
pub fn validate_institutional_email(email: &str, domain: &str) -> Result<(), DomainError> {
    let suffix = format!("@{domain}");
    if !email.ends_with(&suffix) || email.len() == suffix.len() {
        return Err(DomainError::validation(format!(
            "You must register with a valid {domain} email address"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length_bounds_are_inclusive() {
        assert!(validate_password(&"t".repeat(9)).is_err());
        assert!(validate_password(&"t".repeat(10)).is_ok());
        assert!(validate_password(&"t".repeat(32)).is_ok());
        assert!(validate_password(&"t".repeat(33)).is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn email_must_match_institution() {
        assert!(validate_institutional_email("me@uni.edu", "uni.edu").is_ok());
        assert!(validate_institutional_email("me@elsewhere.edu", "uni.edu").is_err());
        // suffix match alone is not enough
        assert!(validate_institutional_email("me@notuni.edu", "uni.edu").is_err());
        assert!(validate_institutional_email("@uni.edu", "uni.edu").is_err());
    }
}
