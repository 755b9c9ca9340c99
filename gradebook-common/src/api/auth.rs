//! Bearer credential verification
//!
//! Requests carry `Authorization: Bearer <token>`. A verifier turns the token
//! into the caller's stable subject id; the verification algorithm belongs to
//! the identity provider behind [`IdentityVerifier`].
//!
//! [`JwtVerifier`] validates HS256 tokens signed with a shared secret. The
//! subject id is the `sub` claim and `exp` is enforced.

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::Error;

/// Minimum accepted length of the signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Authentication failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Authorization header must use the Bearer scheme")]
    MalformedHeader,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// Verifies bearer credentials and yields subject ids
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Return the subject id the token was issued for
    async fn verify(&self, token: &str) -> Result<String, AuthError>;
}

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Account email, when the provider includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// HS256 token verifier
#[derive(Clone)]
pub struct JwtVerifier {
    secret: String,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

impl JwtVerifier {
    /// Create a verifier
    ///
    /// Returns an error if the secret is shorter than [`MIN_SECRET_LEN`].
    pub fn new(secret: impl Into<String>) -> Result<Self, Error> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "JWT secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self { secret })
    }

    /// Issue a token for `subject` valid for `ttl_secs`
    ///
    /// Used by tooling and tests; production tokens come from the identity
    /// provider.
    pub fn issue(&self, subject: &str, ttl_secs: u64) -> Result<String, AuthError> {
        let now = unix_now()?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + ttl_secs,
            email: None,
        };
        self.encode(&claims)
    }

    /// Sign arbitrary claims
    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Provider(format!("Failed to sign token: {}", e)))
    }

    /// Decode and validate a token
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => Ok(data.claims),
            Err(err) => {
                use jsonwebtoken::errors::ErrorKind;
                Err(match err.kind() {
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    ErrorKind::InvalidSignature => {
                        AuthError::InvalidToken("invalid signature".to_string())
                    }
                    _ => AuthError::InvalidToken("token validation failed".to_string()),
                })
            }
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.decode(token)?;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }
        Ok(claims.sub)
    }
}

/// Extract the token from an `Authorization` header value
///
/// ```
/// use gradebook_common::api::auth::{extract_bearer_token, AuthError};
///
/// assert_eq!(extract_bearer_token(Some("Bearer abc.def")), Ok("abc.def"));
/// assert_eq!(extract_bearer_token(None), Err(AuthError::MissingCredential));
/// assert_eq!(extract_bearer_token(Some("Basic xyz")), Err(AuthError::MalformedHeader));
/// ```
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

fn unix_now() -> Result<u64, AuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::Provider(format!("System time error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(JwtVerifier::new("short"), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_issued_token_verifies_to_subject() {
        let verifier = JwtVerifier::new(SECRET).unwrap();
        let token = verifier.issue("parent-42", 3600).unwrap();
        assert_eq!(verifier.verify(&token).await.unwrap(), "parent-42");
    }

    #[tokio::test]
    async fn test_token_from_other_secret_rejected() {
        let issuer = JwtVerifier::new("another-secret-that-is-also-long-enough").unwrap();
        let verifier = JwtVerifier::new(SECRET).unwrap();
        let token = issuer.issue("parent-42", 3600).unwrap();
        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let verifier = JwtVerifier::new(SECRET).unwrap();
        let now = unix_now().unwrap();
        let token = verifier
            .encode(&Claims {
                sub: "parent-42".to_string(),
                iat: now - 7200,
                exp: now - 3600,
                email: None,
            })
            .unwrap();
        assert_eq!(verifier.verify(&token).await, Err(AuthError::Expired));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let verifier = JwtVerifier::new(SECRET).unwrap();
        assert!(verifier.verify("not-a-jwt").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_subject_rejected() {
        let verifier = JwtVerifier::new(SECRET).unwrap();
        let token = verifier.issue("  ", 3600).unwrap();
        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(Some("Bearer  tok ")), Ok("tok"));
        assert_eq!(
            extract_bearer_token(Some("Bearer ")),
            Err(AuthError::MalformedHeader)
        );
        assert_eq!(
            extract_bearer_token(Some("tok")),
            Err(AuthError::MalformedHeader)
        );
    }
}
