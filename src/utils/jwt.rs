use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Claims carried by the session cookie.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(user_id: i32, ttl_hours: i64) -> Self {
        let now = Timestamp::now();
        let exp = now.as_second() + SignedDuration::from_hours(ttl_hours).as_secs();

        Self {
            sub: user_id.to_string(),
            iat: now.as_second(),
            exp,
        }
    }

    pub fn user_id(&self) -> AppResult<i32> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid session subject"))
    }
}

/// Signs a session token for `user_id` valid for `ttl_hours`.
pub fn issue_session_token(user_id: i32, secret: &str, ttl_hours: i64) -> AppResult<String> {
    let claims = SessionClaims::new(user_id, ttl_hours);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to sign session token: {}", e),
    })
}

/// Verifies signature and expiry, returning the claims.
pub fn decode_session_token(token: &str, secret: &str) -> AppResult<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::unauthorized("Session has expired")
        }
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            AppError::unauthorized("Invalid session signature")
        }
        _ => AppError::unauthorized("Invalid session token"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    #[test]
    fn test_issue_and_decode() {
        let token = issue_session_token(42, SECRET, 168).unwrap();
        assert_eq!(token.matches('.').count(), 2);

        let claims = decode_session_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_session_token(1, SECRET, 1).unwrap();
        match decode_session_token(&token, "another-secret-of-sufficient-length!!") {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("signature")),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Past the default 60s leeway.
        let token = issue_session_token(1, SECRET, -2).unwrap();
        match decode_session_token(&token, SECRET) {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("expired")),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            decode_session_token("not.a.token", SECRET),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = SessionClaims {
            sub: "abc".to_string(),
            iat: 0,
            exp: 0,
        };
        assert!(claims.user_id().is_err());
    }
}
