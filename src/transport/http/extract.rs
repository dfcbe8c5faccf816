//! Authenticated-principal extractors.
//!
//! The principal is an explicit value threaded through handler signatures,
//! not an ambient request-context entry.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::{bearer_token, validate_token};
use crate::domain::error::AppError;
use crate::domain::model::Principal;
use crate::transport::http::types::AppState;

/// Any authenticated user.
pub struct AuthUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("authorization header is missing"))?;
        let token = bearer_token(header)?;
        let claims = validate_token(&state.config.jwt_secret, token)?;
        Ok(AuthUser(Principal {
            id: claims.sub,
            role: claims.role,
        }))
    }
}

/// An authenticated user holding the admin role.
pub struct AdminUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            return Err(AppError::forbidden("admin role required"));
        }
        Ok(AdminUser(principal))
    }
}
