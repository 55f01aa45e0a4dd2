//! Login verification and bearer token resolution.

use std::sync::Arc;

use serde::Deserialize;

use crate::AuthError;
use crate::client::Client;
use crate::hash::CredentialHasher;
use crate::store::ClientStore;
use crate::token::TokenCodec;

/// A login attempt.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Submitted email.
    pub email: String,
    /// Submitted plaintext password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Decides whether a caller is a known client, and which one.
///
/// Stateless across calls: every decision reads the store afresh.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn ClientStore>,
    hasher: Arc<dyn CredentialHasher>,
    codec: Arc<dyn TokenCodec>,
}

impl Authenticator {
    /// Create an authenticator over its three collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn ClientStore>,
        hasher: Arc<dyn CredentialHasher>,
        codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            store,
            hasher,
            codec,
        }
    }

    /// The client store.
    #[must_use]
    pub fn store(&self) -> &dyn ClientStore {
        self.store.as_ref()
    }

    /// The token codec.
    #[must_use]
    pub fn codec(&self) -> &dyn TokenCodec {
        self.codec.as_ref()
    }

    /// Verify an email/password pair.
    ///
    /// # Errors
    ///
    /// - `ClientNotFound` if no client has this email
    /// - `IncorrectPassword` if the password does not match
    /// - `Storage` if the lookup itself fails
    pub async fn verify(&self, email: &str, password: &str) -> Result<Client, AuthError> {
        let Some(client) = self.store.find_by_email(email).await? else {
            tracing::debug!(email = %email, "Login rejected: unknown email");
            return Err(AuthError::ClientNotFound);
        };

        if !self.hasher.verify(password, &client.password_hash) {
            tracing::debug!(client_id = %client.id, "Login rejected: incorrect password");
            return Err(AuthError::IncorrectPassword);
        }

        tracing::debug!(client_id = %client.id, "Login verified");
        Ok(client)
    }

    /// Resolve a bearer token to the client it names.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if the token does not decode, carries no
    ///   subject, or names no stored client
    /// - `Storage` if the lookup itself fails
    pub async fn resolve(&self, token: &str) -> Result<Client, AuthError> {
        let payload = match self.codec.decode(token) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::debug!("Token rejected: no subject");
                return Err(AuthError::AuthenticationFailed);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                return Err(AuthError::AuthenticationFailed);
            }
        };

        let Some(client) = self.store.find_by_id(&payload.sub).await? else {
            tracing::debug!(client_id = %payload.sub, "Token rejected: unknown subject");
            return Err(AuthError::AuthenticationFailed);
        };

        Ok(client)
    }

    /// Register a new client with a freshly hashed password.
    ///
    /// # Errors
    ///
    /// - `ClientExists` if the email is taken
    /// - `Hashing` or `Storage` if a collaborator fails
    pub async fn register(&self, credentials: &Credentials) -> Result<Client, AuthError> {
        let password_hash = self.hasher.hash(&credentials.password)?;
        let client = Client::new(credentials.email.clone(), password_hash);

        self.store.create(&client).await?;

        tracing::info!(client_id = %client.id, email = %client.email, "Client registered");
        Ok(client)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}
