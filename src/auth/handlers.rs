use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest, UsersResponse},
        services::{authenticate, register_user},
    },
    error::{ApiError, AuthError},
    state::AppState,
};

const REGISTER_FAILED: &str = "An error occurred during registration";
const LOGIN_FAILED: &str = "An error occurred during login";
const LIST_FAILED: &str = "An error occurred while fetching users";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn users_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

// Body parse failures are unexpected errors, not validation errors.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload.map(|Json(v)| v).map_err(|e| {
        warn!(error = %e, "unreadable request body");
        AuthError::Unexpected(anyhow::anyhow!(e.body_text()))
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let form = body(payload).map_err(|e| e.into_api(REGISTER_FAILED))?;
    let user = register_user(&state.store, &form)
        .await
        .map_err(|e| e.into_api(REGISTER_FAILED))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully",
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let form = body(payload).map_err(|e| e.into_api(LOGIN_FAILED))?;
    let user = authenticate(&state.store, &form)
        .await
        .map_err(|e| e.into_api(LOGIN_FAILED))?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful",
        user,
    }))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.store.list_users().await.map_err(|e| {
        error!(error = %e, "list users failed");
        ApiError::Internal(LIST_FAILED)
    })?;

    Ok(Json(UsersResponse {
        success: true,
        count: users.len(),
        users,
    }))
}
