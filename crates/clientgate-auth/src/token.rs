//! Bearer token encoding and decoding.

use std::time::Duration;

use chrono::{DateTime, Utc};
use clientgate_core::AuthConfig;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AuthError;

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Subject (client ID).
    #[serde(default)]
    pub sub: String,
    /// Issued at (Unix timestamp).
    #[serde(default)]
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Errors raised by the token layer.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token is past its expiry.
    #[error("Token expired")]
    Expired,

    /// Signature does not match.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Token could not be parsed or failed a validation rule.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Token could not be produced.
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Malformed(e.to_string()),
        }
    }
}

/// A freshly minted access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Encoded token.
    pub access_token: String,
    /// Token type (always "bearer").
    pub token_type: String,
    /// Expiration.
    pub expires_at: DateTime<Utc>,
}

/// Token encode/decode primitive.
pub trait TokenCodec: Send + Sync {
    /// Decode and validate a token.
    ///
    /// Returns `Ok(None)` when the token is valid but carries no usable
    /// subject.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` for malformed, expired or badly signed tokens.
    fn decode(&self, token: &str) -> Result<Option<TokenPayload>, TokenError>;

    /// Mint a token for `subject`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if the token cannot be produced.
    fn encode(&self, subject: &str) -> Result<IssuedToken, TokenError>;
}

/// HS256 JWT codec.
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl JwtCodec {
    /// Create a codec with a secret key.
    ///
    /// The secret should be at least 32 bytes.
    #[must_use]
    pub fn new(secret: &[u8], expiry: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expiry,
        }
    }

    /// Tolerate `secs` of clock skew when checking expiry.
    #[must_use]
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.validation.leeway = secs;
        self
    }

    /// Create a codec from a hex-encoded secret.
    ///
    /// # Errors
    ///
    /// Returns error if hex decoding fails.
    pub fn from_hex_secret(hex_secret: &SecretString, expiry: Duration) -> Result<Self, AuthError> {
        let secret = hex::decode(hex_secret.expose_secret())
            .map_err(|e| AuthError::Config(format!("Invalid hex secret: {e}")))?;
        Ok(Self::new(&secret, expiry))
    }

    /// Create a codec from auth configuration.
    ///
    /// Without a configured secret an ephemeral one is generated, so tokens
    /// stop validating after a restart.
    ///
    /// # Errors
    ///
    /// Returns error if the configured secret is not valid hex.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let secret = config.secret().unwrap_or_else(|| {
            tracing::warn!("No JWT secret configured, generated an ephemeral one");
            SecretString::from(Self::generate_hex_secret())
        });

        Ok(Self::from_hex_secret(&secret, config.token_expiry())?.with_leeway(config.leeway_secs))
    }

    /// Generate a random 256-bit secret key.
    #[must_use]
    pub fn generate_secret() -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    /// Generate a random secret as hex string.
    #[must_use]
    pub fn generate_hex_secret() -> String {
        hex::encode(Self::generate_secret())
    }
}

impl TokenCodec for JwtCodec {
    fn decode(&self, token: &str) -> Result<Option<TokenPayload>, TokenError> {
        let payload = decode::<TokenPayload>(token, &self.decoding_key, &self.validation)?.claims;

        if payload.sub.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(payload))
    }

    fn encode(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(self.expiry)
            .ok()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                TokenError::Encoding(format!("Token lifetime out of range: {:?}", self.expiry))
            })?;

        let payload = TokenPayload {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            token_type: "bearer".to_string(),
            expires_at,
        })
    }
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCodec")
            .field("expiry", &self.expiry)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}
