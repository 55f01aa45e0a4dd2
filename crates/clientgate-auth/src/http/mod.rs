//! axum bindings for the login and per-request authentication flows.
//!
//! Routes:
//! - `POST /{tokenUrl}` (default `/api/clients/login`): OAuth2 password form
//!   (`username` is the email)
//! - `POST /api/clients/auth`: JSON `{ is_new, email, password }`
//! - `GET /api/clients/me`: the client behind the bearer token
//! - `GET /health`

mod extract;

pub use extract::{CurrentClient, bearer_token};

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    routing::{get, post},
};
use clientgate_core::{AuthConfig, Config, check_password, normalize_email};
use serde::{Deserialize, Serialize};

use crate::AuthError;
use crate::authenticator::{Authenticator, Credentials};
use crate::client::{Client, PublicClient};
use crate::hash::Argon2Hasher;
use crate::store::SledClientStore;
use crate::token::JwtCodec;

/// Shared authentication state.
pub struct AuthState {
    /// Auth configuration.
    pub config: AuthConfig,
    /// Login and token decisions.
    pub authenticator: Authenticator,
}

impl AuthState {
    /// Create a new auth state.
    #[must_use]
    pub const fn new(config: AuthConfig, authenticator: Authenticator) -> Self {
        Self {
            config,
            authenticator,
        }
    }

    /// Build the default stack: sled store, Argon2 hasher, JWT codec.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be opened or the secret is invalid.
    pub fn initialize(config: &Config) -> Result<Self, AuthError> {
        let data_dir = config.store.data_dir();
        let store = SledClientStore::open(&data_dir)?;
        let codec = JwtCodec::from_config(&config.auth)?;

        tracing::debug!(data_dir = %data_dir.display(), "Auth state initialized");

        let authenticator =
            Authenticator::new(Arc::new(store), Arc::new(Argon2Hasher::new()), Arc::new(codec));
        Ok(Self::new(config.auth.clone(), authenticator))
    }

    /// Apply the configured masking policy to a login failure.
    fn login_error(&self, err: AuthError) -> AuthError {
        if self.config.mask_login_failures {
            err.masked()
        } else {
            err
        }
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

const HEALTH_PATH: &str = "/health";
const AUTH_PATH: &str = "/api/clients/auth";
const ME_PATH: &str = "/api/clients/me";
const DEFAULT_LOGIN_PATH: &str = "/api/clients/login";

/// Build the authentication router.
///
/// The login form is mounted at `config.token_url`. A token URL that would
/// shadow another route falls back to the default path.
pub fn router(state: Arc<AuthState>) -> Router {
    let mut login_path = state.config.login_path();
    if [HEALTH_PATH, AUTH_PATH, ME_PATH].contains(&login_path.as_str()) {
        tracing::warn!(
            token_url = %state.config.token_url,
            "Token URL collides with another route, using {DEFAULT_LOGIN_PATH}"
        );
        login_path = DEFAULT_LOGIN_PATH.to_string();
    }

    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(&login_path, post(login_handler))
        .route(AUTH_PATH, post(auth_handler))
        .route(ME_PATH, get(me_handler))
        .with_state(state)
}

/// OAuth2 password-flow form. Extra OAuth2 fields are ignored.
#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

/// Register-or-login request.
#[derive(Deserialize)]
struct AuthRequest {
    #[serde(default)]
    is_new: bool,
    email: String,
    password: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClientResponse {
    client: PublicClient,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self {
            client: client.to_public(),
        }
    }
}

/// Validate and normalize submitted credentials.
fn parse_credentials(email: &str, password: String) -> Result<Credentials, AuthError> {
    let email = normalize_email(email)?;
    check_password(&password)?;
    Ok(Credentials { email, password })
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn login_handler(
    State(state): State<Arc<AuthState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<ClientResponse>, AuthError> {
    let credentials = parse_credentials(&form.username, form.password)?;

    let client = state
        .authenticator
        .verify(&credentials.email, &credentials.password)
        .await
        .map_err(|e| state.login_error(e))?;

    Ok(Json(client.into()))
}

async fn auth_handler(
    State(state): State<Arc<AuthState>>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<ClientResponse>, AuthError> {
    let credentials = parse_credentials(&request.email, request.password)?;

    let client = if request.is_new {
        state.authenticator.register(&credentials).await?
    } else {
        state
            .authenticator
            .verify(&credentials.email, &credentials.password)
            .await
            .map_err(|e| state.login_error(e))?
    };

    Ok(Json(client.into()))
}

async fn me_handler(CurrentClient(client): CurrentClient) -> Json<ClientResponse> {
    Json(client.into())
}
