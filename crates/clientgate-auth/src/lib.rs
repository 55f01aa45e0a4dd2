//! # clientgate auth
//!
//! Authentication decisions for a web API.
//!
//! This crate provides:
//! - Login verification: email + password against a stored Argon2 hash
//! - Bearer token resolution: JWT subject to a stored client
//! - Collaborator traits for the store, the hasher and the token codec
//! - axum bindings: login handlers, the `CurrentClient` extractor, a router

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authenticator;
mod client;
pub mod hash;
pub mod http;
pub mod store;
pub mod token;

pub use authenticator::{Authenticator, Credentials};
pub use client::{Client, PublicClient};
pub use hash::{Argon2Hasher, CredentialHasher};
pub use http::{AuthState, CurrentClient, router};
pub use store::{ClientStore, MemoryClientStore, SledClientStore};
pub use token::{IssuedToken, JwtCodec, TokenCodec, TokenError, TokenPayload};

pub use clientgate_core::{AuthConfig, Config};

use clientgate_core::ValidationError;
use thiserror::Error;

/// Authentication errors.
///
/// `ClientNotFound` and `IncorrectPassword` come only from the login path,
/// `AuthenticationFailed` only from token resolution.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No client is registered under the submitted email.
    #[error("Client not found")]
    ClientNotFound,

    /// The password does not match the stored hash.
    #[error("Incorrect password")]
    IncorrectPassword,

    /// The bearer token is missing, malformed, expired, badly signed, or
    /// names no known client.
    #[error("Could not validate credentials")]
    AuthenticationFailed,

    /// A login failure reported without saying which check failed.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// A client with this email already exists.
    #[error("Client already exists: {0}")]
    ClientExists(String),

    /// Request input failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Password hashing failed.
    #[error("Hashing error: {0}")]
    Hashing(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

impl AuthError {
    /// Collapse the two login rejections into `InvalidCredentials`.
    ///
    /// Every other error is returned unchanged.
    #[must_use]
    pub fn masked(self) -> Self {
        match self {
            Self::ClientNotFound | Self::IncorrectPassword => Self::InvalidCredentials,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_login_errors() {
        assert!(matches!(
            AuthError::ClientNotFound.masked(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::IncorrectPassword.masked(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::AuthenticationFailed.masked(),
            AuthError::AuthenticationFailed
        ));
        assert!(matches!(
            AuthError::Storage("down".to_string()).masked(),
            AuthError::Storage(_)
        ));
    }

    #[test]
    fn test_validation_errors_convert() {
        let err: AuthError = ValidationError::Empty { field: "email" }.into();
        assert_eq!(err.to_string(), "Invalid input: email must not be empty");
    }
}
