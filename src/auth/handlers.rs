use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest},
        errors::AuthError,
        extractors::AuthUser,
        repo_types::PublicUser,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), Response> {
    if let Err(msg) = payload.validate() {
        warn!(reason = msg, "invalid registration request");
        return Err(bad_request(msg));
    }

    let user = state
        .accounts
        .register(&payload.email, &payload.username, &payload.password)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::DuplicateEmail) {
                warn!(email = %payload.email, "email already registered");
            }
            e.into_response()
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Response> {
    if let Err(msg) = payload.validate() {
        warn!(reason = msg, "invalid login request");
        return Err(bad_request(msg));
    }

    let (token, user) = state
        .accounts
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                warn!(email = %payload.email, "login invalid credentials");
            }
            e.into_response()
        })?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        token,
        expires_in: state.accounts.token_ttl().as_secs() as i64,
        user,
    }))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.accounts.profile(claims.sub).await?;
    Ok(Json(user))
}
