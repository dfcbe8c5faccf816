//! JWT issuance and validation (HS256).

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues a signed token carrying the user id and role.
pub fn issue_token(
    secret: &str,
    user_id: i64,
    role: &str,
    ttl: Duration,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        iat: now,
        exp: now + ttl.as_secs() as i64,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("failed to sign token: {e}")))
}

/// Validates a token, rejecting expired, malformed, or wrong-algorithm tokens.
pub fn validate_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("invalid token"))
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Result<&str, AppError> {
    header
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("authorization header must be a bearer token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn issue_then_validate_round_trip() {
        let token = issue_token(SECRET, 42, "admin", Duration::from_secs(60)).unwrap();
        let claims = validate_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(SECRET, 1, "user", Duration::from_secs(0)).unwrap();
        // jsonwebtoken applies default leeway; push exp well into the past.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "user".into(),
            iat: now - 3600,
            exp: now - 3000,
        };
        let stale = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(validate_token(SECRET, &stale).is_err());
        // The zero-ttl token is within leeway and remains formally valid.
        let _ = token;
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, 7, "user", Duration::from_secs(60)).unwrap();
        assert!(validate_token("other-secret", &token).is_err());
    }

    #[test]
    fn wrong_algorithm_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 9,
            role: "user".into(),
            iat: now,
            exp: now + 60,
        };
        let hs384 = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(validate_token(SECRET, &hs384).is_err());
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert!(bearer_token("Bearer abc").is_ok());
        assert!(bearer_token("Basic abc").is_err());
        assert!(bearer_token("").is_err());
        assert!(bearer_token("Bearer ").is_err());
    }
}
