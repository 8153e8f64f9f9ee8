//! Stateless session tokens.
//!
//! A session is a signed JWT (HS256) carrying `{sub, iat, exp}`. Nothing is
//! stored server side: a token is valid exactly when its signature checks
//! out against the server secret, it has not expired, and its subject is a
//! well-formed username.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::validation::Username;

/// Default session lifetime, 24 hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session secret must not be empty")]
    EmptySecret,
    #[error("failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// An issued session credential.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Issues and resolves session tokens.
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a session manager signing with `secret`.
    ///
    /// # Arguments
    ///
    /// * `secret` - HMAC key; 32 random bytes is what `stash init` generates
    /// * `ttl` - How long an issued token stays valid
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        // expiry is exact; a token is dead the second `exp` passes
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for an authenticated user.
    pub fn issue(&self, username: &Username) -> Result<SessionToken, SessionError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(SessionToken(token))
    }

    /// Resolve a presented token to the username it was issued for.
    ///
    /// Returns `None` when no token was presented or when it is malformed,
    /// expired, signed with a different key, or names an invalid username.
    pub fn resolve(&self, token: Option<&str>) -> Option<Username> {
        let token = token?.trim();
        if token.is_empty() {
            return None;
        }

        let data = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "rejected session token");
                return None;
            }
        };

        Username::parse(&data.claims.sub).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes";

    fn ttl() -> Duration {
        Duration::seconds(DEFAULT_SESSION_TTL_SECS)
    }

    fn alice() -> Username {
        Username::parse("alice").unwrap()
    }

    #[test]
    fn test_issue_and_resolve() {
        let manager = SessionManager::new(SECRET, ttl()).unwrap();

        let token = manager.issue(&alice()).unwrap();
        assert_eq!(manager.resolve(Some(token.as_str())), Some(alice()));
    }

    #[test]
    fn test_resolve_missing_or_garbage() {
        let manager = SessionManager::new(SECRET, ttl()).unwrap();

        assert_eq!(manager.resolve(None), None);
        assert_eq!(manager.resolve(Some("")), None);
        assert_eq!(manager.resolve(Some("invalid_token")), None);
        assert_eq!(manager.resolve(Some("a.b.c")), None);
    }

    #[test]
    fn test_token_with_wrong_secret() {
        let manager1 = SessionManager::new(b"secret_key_1_at_least_32_bytes_long", ttl())
            .unwrap();
        let manager2 = SessionManager::new(b"secret_key_2_at_least_32_bytes_long", ttl())
            .unwrap();

        let token = manager1.issue(&alice()).unwrap();
        assert_eq!(manager2.resolve(Some(token.as_str())), None);
    }

    #[test]
    fn test_expired_token() {
        let manager = SessionManager::new(SECRET, Duration::seconds(-10)).unwrap();

        let token = manager.issue(&alice()).unwrap();
        assert_eq!(manager.resolve(Some(token.as_str())), None);
    }

    #[test]
    fn test_invalid_subject_does_not_resolve() {
        let manager = SessionManager::new(SECRET, ttl()).unwrap();
        let now = Utc::now();
        let claims = Claims {
            sub: "../etc".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(manager.resolve(Some(&token)), None);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            SessionManager::new(b"", ttl()),
            Err(SessionError::EmptySecret)
        ));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let manager = SessionManager::new(SECRET, ttl()).unwrap();
        let token = manager.issue(&alice()).unwrap();
        assert!(!format!("{token:?}").contains(token.as_str()));
    }
}
