//! JWT token service implementation.
//!
//! Two token shapes share the signing key but never validate as each
//! other: session tokens (scope `session`, also used for magic login) and
//! short verification tokens (scope `verify`, carrying only the user id).

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use studyhall_core::ports::{AuthError, SessionClaims, TokenService};

const SCOPE_SESSION: &str = "session";
const SCOPE_VERIFY: &str = "verify";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    /// Session token lifetime.
    pub access_hours: i64,
    /// Window after issue during which an expired token may still be refreshed.
    pub refresh_days: i64,
    /// Minimum age before a token becomes refreshable.
    pub refresh_floor_minutes: i64,
    /// Verification token lifetime.
    pub verification_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            issuer: "studyhall-api".to_string(),
            access_hours: 24,
            refresh_days: 30,
            refresh_floor_minutes: 30,
            verification_days: 7,
        }
    }
}

/// Internal JWT claims structure for serialization.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    scope: String,
    exp: i64, // expiration timestamp
    iat: i64, // issued at
    iss: String,
}

/// JWT-based token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }

    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-in-production".to_string());

        if secret == "change-me-in-production" {
            tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
        }

        let config = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "studyhall-api".to_string()),
            ..JwtConfig::default()
        };
        Self::new(config)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn decode_claims(&self, token: &str, validate_exp: bool) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.validate_exp = validate_exp;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }

    fn issue_session_at(&self, user_id: i32, email: &str, issued_at: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: Some(email.to_string()),
            scope: SCOPE_SESSION.to_string(),
            exp: issued_at + TimeDelta::hours(self.config.access_hours).num_seconds(),
            iat: issued_at,
            iss: self.config.issuer.clone(),
        };
        self.encode_claims(&claims)
    }

    fn session_claims(claims: Claims) -> Result<SessionClaims, AuthError> {
        if claims.scope != SCOPE_SESSION {
            return Err(AuthError::InvalidToken("not a session token".to_string()));
        }

        let user_id = claims
            .sub
            .parse::<i32>()
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let email = claims
            .email
            .ok_or_else(|| AuthError::InvalidToken("missing email claim".to_string()))?;

        Ok(SessionClaims {
            user_id,
            email,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: i32, email: &str) -> Result<String, AuthError> {
        self.issue_session_at(user_id, email, Utc::now().timestamp())
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        Self::session_claims(self.decode_claims(token, true)?)
    }

    fn refresh(&self, token: &str) -> Result<String, AuthError> {
        // expiry is deliberately not validated: refreshing an expired
        // session is the normal case
        let claims = Self::session_claims(self.decode_claims(token, false)?)?;

        let age = Utc::now().timestamp() - claims.issued_at;
        if age < TimeDelta::minutes(self.config.refresh_floor_minutes).num_seconds() {
            return Err(AuthError::RefreshTooEarly);
        }
        if age > TimeDelta::days(self.config.refresh_days).num_seconds() {
            return Err(AuthError::TokenExpired);
        }

        self.issue_session_at(claims.user_id, &claims.email, Utc::now().timestamp())
    }

    fn issue_verification(&self, user_id: i32) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: None,
            scope: SCOPE_VERIFY.to_string(),
            exp: now + TimeDelta::days(self.config.verification_days).num_seconds(),
            iat: now,
            iss: self.config.issuer.clone(),
        };
        self.encode_claims(&claims)
    }

    fn verify_verification(&self, token: &str) -> Result<i32, AuthError> {
        let claims = self.decode_claims(token, true)?;
        if claims.scope != SCOPE_VERIFY {
            return Err(AuthError::InvalidToken(
                "not a verification token".to_string(),
            ));
        }

        claims
            .sub
            .parse::<i32>()
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            issuer: "test-issuer".to_string(),
            ..JwtConfig::default()
        }
    }

    fn service() -> JwtTokenService {
        JwtTokenService::new(test_config())
    }

    #[test]
    fn session_token_round_trips() {
        let service = service();
        let token = service.issue(42, "test@uni.edu").unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "test@uni.edu");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let result = service().verify("not-a-token");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let other = JwtTokenService::new(JwtConfig {
            issuer: "someone-else".to_string(),
            ..test_config()
        });

        let token = other.issue(1, "a@uni.edu").unwrap();
        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn verification_token_round_trips() {
        let service = service();
        let token = service.issue_verification(7).unwrap();
        assert_eq!(service.verify_verification(&token).unwrap(), 7);
    }

    #[test]
    fn token_scopes_are_not_interchangeable() {
        let service = service();

        let session = service.issue(1, "a@uni.edu").unwrap();
        assert!(matches!(
            service.verify_verification(&session),
            Err(AuthError::InvalidToken(_))
        ));

        let verification = service.issue_verification(1).unwrap();
        assert!(matches!(
            service.verify(&verification),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn refresh_rejects_fresh_tokens() {
        let service = service();
        let token = service.issue(1, "a@uni.edu").unwrap();

        // just issued, well under the 30 minute floor
        assert!(matches!(
            service.refresh(&token),
            Err(AuthError::RefreshTooEarly)
        ));
    }

    #[test]
    fn refresh_accepts_an_expired_but_refreshable_token() {
        let service = service();
        // issued two days ago: past its 24h expiry, inside the refresh window
        let issued_at = Utc::now().timestamp() - TimeDelta::days(2).num_seconds();
        let token = service.issue_session_at(1, "a@uni.edu", issued_at).unwrap();

        assert!(matches!(service.verify(&token), Err(AuthError::TokenExpired)));

        let refreshed = service.refresh(&token).unwrap();
        let claims = service.verify(&refreshed).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.email, "a@uni.edu");
    }

    #[test]
    fn refresh_rejects_tokens_past_the_refresh_window() {
        let service = service();
        let issued_at = Utc::now().timestamp() - TimeDelta::days(31).num_seconds();
        let token = service.issue_session_at(1, "a@uni.edu", issued_at).unwrap();

        assert!(matches!(
            service.refresh(&token),
            Err(AuthError::TokenExpired)
        ));
    }
}
