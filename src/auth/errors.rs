use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::directory::{BoxError, DirectoryError};
use super::jwt::TokenError;
use super::password::PasswordError;

/// Outcomes of account operations, mapped to HTTP responses by the caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    DuplicateEmail,
    /// Same value for an unknown email and a wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken(#[source] TokenError),
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Hashing(#[from] PasswordError),
    #[error("token signing failed")]
    Signing(#[source] TokenError),
    #[error("user store failure")]
    Store(#[source] BoxError),
}

impl From<DirectoryError> for AuthError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Duplicate => AuthError::DuplicateEmail,
            DirectoryError::Store(source) => AuthError::Store(source),
        }
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Hashing(_) | AuthError::Signing(_) | AuthError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, source = ?std::error::Error::source(&self), "account operation failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
