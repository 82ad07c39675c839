use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use super::claims::Claims;
use super::errors::AuthError;
use crate::state::AppState;

/// Extracts and validates the bearer token, yielding its claims.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized =
            |msg: &str| (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg })));

        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| unauthorized("Authorization header required"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| unauthorized("Invalid authorization format"))?;

        match state.accounts.authenticate(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(AuthError::InvalidToken(cause)) => {
                warn!(reason = cause.reason(), "rejected bearer token");
                Err(unauthorized("Invalid token"))
            }
            Err(e) => {
                warn!(error = %e, "bearer token check failed");
                Err(unauthorized("Invalid token"))
            }
        }
    }
}
