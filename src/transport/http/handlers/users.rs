use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::auth::{hash_password, verify_password};
use crate::domain::error::{AppError, ErrorBody};
use crate::storage::object::keys::{self, BUCKET_USER_PHOTOS};
use crate::storage::repo::users;
use crate::transport::http::extract::AuthUser;
use crate::transport::http::types::{
    bad_json, AppState, ChangePasswordRequest, UpdateProfileRequest,
};
use crate::transport::http::views::ProfileView;
use crate::validation::{ensure_image, ensure_size, validate, MAX_PHOTO_BYTES};

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current profile", body = ProfileView),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn get_profile_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = users::get(&state.pool, actor.id).await?;
    Ok(Json(ProfileView::from_user(&user)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileView),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn update_profile_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    request: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    let user = users::update_profile(
        &state.pool,
        actor.id,
        request.first_name.as_deref(),
        request.last_name.as_deref(),
        request.helper_name.as_deref(),
    )
    .await?;
    Ok(Json(ProfileView::from_user(&user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/me/photo",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Photo stored"),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 415, description = "Unsupported media type", body = ErrorBody)
    )
)]
pub async fn upload_photo_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("failed to read upload: {e}")))?;

        ensure_size(bytes.len(), MAX_PHOTO_BYTES, "5MB")?;
        ensure_image(filename.as_deref(), Some(&content_type))?;

        let key = keys::user_photo_key(actor.id, &content_type);
        state
            .store
            .put_object(BUCKET_USER_PHOTOS, &key, bytes.to_vec(), &content_type)
            .await?;
        let url = keys::object_url(state.store.config(), BUCKET_USER_PHOTOS, &key);
        users::set_photo_url(&state.pool, actor.id, &url).await?;
        return Ok(Json(json!({ "photo_url": keys::public_path(&url) })));
    }
    Err(AppError::validation_with(
        "file not found",
        json!({"field": "photo"}),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/me/change-password",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Wrong old password", body = ErrorBody)
    )
)]
pub async fn change_password_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    request: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;

    let user = users::get(&state.pool, actor.id).await?;
    if !verify_password(&request.old_password, &user.password_hash) {
        return Err(AppError::unauthorized("wrong old password"));
    }
    let password_hash = hash_password(&request.new_password)?;
    users::set_password_hash(&state.pool, actor.id, &password_hash).await?;
    Ok(Json(json!({ "message": "password changed" })))
}
