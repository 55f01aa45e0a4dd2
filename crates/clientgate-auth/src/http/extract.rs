//! Per-request client resolution and error responses.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{
        StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        request::Parts,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::AuthState;
use crate::AuthError;
use crate::client::Client;

/// Extractor for the client behind the request's bearer token.
///
/// Use this in handler parameters to require authentication.
#[derive(Debug, Clone)]
pub struct CurrentClient(pub Client);

impl<S> FromRequestParts<S> for CurrentClient
where
    S: Send + Sync,
    Arc<AuthState>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = Arc::<AuthState>::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| {
                tracing::debug!("Missing or malformed Authorization header");
                AuthError::AuthenticationFailed
            })?;

        let client = auth_state.authenticator.resolve(token).await?;
        Ok(Self(client))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Error response for auth failures.
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::ClientNotFound => (StatusCode::NOT_FOUND, "client_not_found"),
            Self::IncorrectPassword => (StatusCode::UNAUTHORIZED, "incorrect_password"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            Self::AuthenticationFailed => (StatusCode::UNAUTHORIZED, "authentication_failed"),
            Self::ClientExists(_) => (StatusCode::CONFLICT, "client_exists"),
            Self::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input"),
            Self::Hashing(_) | Self::Storage(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Authentication backend failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        let body = AuthErrorResponse { error, code };

        if matches!(self, Self::AuthenticationFailed) {
            return (status, [(WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response();
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("BEARER  abc123 "), Some("abc123"));
        assert_eq!(bearer_token("abc123"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc123"), None);
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AuthError::ClientNotFound, StatusCode::NOT_FOUND),
            (AuthError::IncorrectPassword, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::AuthenticationFailed, StatusCode::UNAUTHORIZED),
            (AuthError::ClientExists("a@b.com".to_string()), StatusCode::CONFLICT),
            (
                AuthError::Storage("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_only_token_failures_challenge() {
        let response = AuthError::AuthenticationFailed.into_response();
        assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");

        let response = AuthError::InvalidCredentials.into_response();
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }
}
