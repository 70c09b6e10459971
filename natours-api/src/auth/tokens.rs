//! JWT issuance and verification
//!
//! HS256 with a single configured secret. Claims stay minimal: the subject
//! is the user identifier, plus issued-at and expiry timestamps. The
//! issued-at claim is what lets the protect middleware reject tokens older
//! than a password change.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::Error;

/// Claims carried by every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier
    pub sub: String,
    /// Issued at (seconds since the epoch)
    pub iat: i64,
    /// Expiry (seconds since the epoch)
    pub exp: i64,
}

/// Issues and verifies the service's JWTs
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
}

impl TokenService {
    /// Build the service from auth configuration
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime_secs: (config.jwt_expires_in_days * 24 * 60 * 60) as i64,
        }
    }

    /// Issue a token for a user, valid for the configured lifetime
    pub fn issue(&self, user_id: &str) -> Result<String, Error> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    fn issue_at(&self, user_id: &str, issued_at: i64) -> Result<String, Error> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at + self.lifetime_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token and return its claims
    ///
    /// Expired and otherwise invalid tokens both fail authentication, with
    /// messages safe to show the caller.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Error::Unauthorized(
                    "Your token has expired! Please log in again.".to_string(),
                ),
                _ => Error::Unauthorized("Invalid token. Please log in again.".to_string()),
            })
    }
}
