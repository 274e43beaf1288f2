//! JWT token issuance and validation

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Identity claims carried inside a session token.
///
/// The token is the only session state the server has: validity is entirely
/// a function of the signature and `exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: i64,
    /// Email
    pub email: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// JWT manager for token operations
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    /// Issue a session token for the given user
    pub fn issue_token(&self, user_id: i64, email: &str) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + Duration::hours(self.expiry_hours);

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };

        // Explicit algorithm prevents algorithm confusion attacks
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validate and decode a token.
    ///
    /// The error variants are for internal diagnostics only; at the HTTP
    /// boundary they all collapse into the same generic 401.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No clock-skew leeway: a token is rejected the instant `exp` passes
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => JwtError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::Base64(_)
                | jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::Utf8(_) => JwtError::Malformed,
                _ => JwtError::Validation(e.to_string()),
            })
    }

    /// Token lifetime in seconds
    pub fn expiry_seconds(&self) -> i64 {
        self.expiry_hours * 3600
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token is malformed")]
    Malformed,
    #[error("Token encoding failed: {0}")]
    Encoding(String),
    #[error("Token validation failed: {0}")]
    Validation(String),
}
