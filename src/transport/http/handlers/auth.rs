use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::auth::{hash_password, issue_token, verify_password};
use crate::domain::error::{AppError, ErrorBody};
use crate::storage::repo::users;
use crate::transport::http::extract::AuthUser;
use crate::transport::http::types::{bad_json, AppState, LoginRequest, RegisterRequest};
use crate::transport::http::views::ProfileView;
use crate::validation::{ensure_phone, normalize_phone, validate};

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Phone already registered", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;
    ensure_phone(&request.phone)?;

    let phone = normalize_phone(&request.phone);
    let password_hash = hash_password(&request.password)?;
    let user = users::create(
        &state.pool,
        &phone,
        &password_hash,
        &request.first_name,
        &request.last_name,
    )
    .await?;

    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        &user.role,
        state.config.jwt_access_ttl,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user_id": user.id,
            "token": token,
            "message": "user registered",
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated"),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 403, description = "Account deactivated", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;

    let phone = normalize_phone(&request.phone);
    let user = users::get_by_phone(&state.pool, &phone)
        .await
        .map_err(|_| AppError::unauthorized("invalid credentials"))?;
    if !verify_password(&request.password, &user.password_hash) {
        return Err(AppError::unauthorized("invalid credentials"));
    }
    if !user.is_active {
        return Err(AppError::forbidden("account is deactivated"));
    }

    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        &user.role,
        state.config.jwt_access_ttl,
    )?;
    Ok(Json(json!({
        "user_id": user.id,
        "token": token,
        "user": ProfileView::from_user(&user),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fresh token issued"),
        (status = 401, description = "Invalid token", body = ErrorBody)
    )
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    // Re-read the user so role changes and deactivation take effect here.
    let user = users::get(&state.pool, actor.id)
        .await
        .map_err(|_| AppError::unauthorized("user no longer exists"))?;
    if !user.is_active {
        return Err(AppError::forbidden("account is deactivated"));
    }
    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        &user.role,
        state.config.jwt_access_ttl,
    )?;
    Ok(Json(json!({ "token": token })))
}
