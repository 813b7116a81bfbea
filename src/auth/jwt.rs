//! Bearer token issuance and verification
//!
//! Tokens are stateless HS256 JWTs. The subject claim carries the user's
//! ObjectId (hex); nothing is stored server-side, so a token stays valid until
//! its `exp` passes.

use bson::oid::ObjectId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::Identity;
use crate::config::MIN_JWT_SECRET_LEN;
use crate::types::{BrainError, Result};

/// Payload stored in the JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ObjectId, hex encoded
    pub sub: String,
    /// Username at issue time
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly signed token and when it stops being accepted
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

/// Signs and verifies bearer tokens with a shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: u64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("expiry_seconds", &self.expiry_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service
    ///
    /// Returns a configuration error if the secret is missing or too short.
    pub fn new(secret: Option<&str>, expiry_seconds: u64) -> Result<Self> {
        let secret = match secret {
            Some(s) if !s.is_empty() => s,
            _ => return Err(BrainError::Config("JWT_SECRET is required".into())),
        };

        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(BrainError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_JWT_SECRET_LEN
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        })
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: &ObjectId, username: &str) -> Result<IssuedToken> {
        let now = unix_now()?;

        let claims = Claims {
            sub: user_id.to_hex(),
            username: username.to_string(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| BrainError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Verify a token and return the identity it was issued for
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid signature",
                ErrorKind::InvalidToken => "Malformed token",
                _ => "Token validation failed",
            };
            BrainError::Unauthorized(reason.into())
        })?;

        let user_id = ObjectId::parse_str(&data.claims.sub)
            .map_err(|_| BrainError::Unauthorized("Invalid subject".into()))?;

        Ok(Identity {
            user_id,
            username: data.claims.username,
        })
    }
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| BrainError::Internal(format!("System time error: {}", e)))
}
