use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;

use crate::domain::error::{AppError, ErrorBody};
use crate::storage::object::keys;
use crate::transport::http::extract::AuthUser;
use crate::transport::http::types::{
    bad_json, AppState, PresignDownloadRequest, PresignUploadRequest,
};
use crate::validation::validate;

const DEFAULT_EXPIRY_SECS: u64 = 3600;

fn expiry(requested: Option<u64>) -> Duration {
    Duration::from_secs(requested.unwrap_or(DEFAULT_EXPIRY_SECS).clamp(1, 604_800))
}

#[utoipa::path(
    post,
    path = "/api/v1/upload/presigned-url",
    security(("bearer_auth" = [])),
    request_body = PresignUploadRequest,
    responses(
        (status = 200, description = "Presigned upload URL"),
        (status = 400, description = "Validation error", body = ErrorBody)
    )
)]
pub async fn presign_upload_handler(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    request: Result<Json<PresignUploadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;

    let expires = expiry(request.expires_in);
    let upload_url = state
        .store
        .presign_put(&request.bucket, &request.object_key, expires);
    let object_url = keys::object_url(state.store.config(), &request.bucket, &request.object_key);
    Ok(Json(json!({
        "upload_url": upload_url,
        "object_url": object_url,
        "expires_at": Utc::now() + chrono::Duration::seconds(expires.as_secs() as i64),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/files/presigned-url",
    security(("bearer_auth" = [])),
    request_body = PresignDownloadRequest,
    responses(
        (status = 200, description = "Presigned download URL"),
        (status = 400, description = "Validation error", body = ErrorBody)
    )
)]
pub async fn presign_download_handler(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    request: Result<Json<PresignDownloadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;

    let expires = expiry(request.expires_in);
    let url = state
        .store
        .presign_get(&request.bucket, &request.object_key, expires);
    Ok(Json(json!({
        "url": url,
        "expires_at": Utc::now() + chrono::Duration::seconds(expires.as_secs() as i64),
    })))
}

#[utoipa::path(
    get,
    path = "/files/{bucket}/{object_key}",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("object_key" = String, Path, description = "Object key; may contain slashes")
    ),
    responses(
        (status = 200, description = "Object bytes with the stored content type"),
        (status = 404, description = "No such object", body = ErrorBody)
    )
)]
pub async fn get_file_handler(
    State(state): State<AppState>,
    Path((bucket, object_key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    if bucket.is_empty() || object_key.is_empty() {
        return Err(AppError::validation("bucket and object key are required"));
    }

    let upstream = state.store.get_object(&bucket, &object_key).await?;
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let content_length = upstream.content_length();
    let filename = object_key
        .rsplit('/')
        .next()
        .unwrap_or(object_key.as_str())
        .to_string();

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(
            CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", filename),
        );
    if let Some(len) = content_length {
        response = response.header(CONTENT_LENGTH, len);
    }
    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::internal(anyhow::anyhow!("failed to build response: {e}")))
}
