use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::domain::error::{AppError, ErrorBody};
use crate::domain::model::{post_status, Post};
use crate::storage::repo::posts::NewPost;
use crate::storage::repo::{posts, users, Page};
use crate::storage::object::keys::{self, BUCKET_POST_MEDIA};
use crate::transport::http::extract::AuthUser;
use crate::transport::http::types::{
    bad_json, AppState, CreatePostRequest, Pagination, PostListQuery, UpdatePostRequest,
};
use crate::transport::http::views::{PostMediaView, PostView};
use crate::validation::{ensure_media, ensure_size, validate, MAX_MEDIA_BYTES};

/// Post record enriched with author info and ordered media.
async fn post_view(state: &AppState, post: &Post) -> Result<PostView, AppError> {
    let author = users::get(&state.pool, post.user_id).await.ok();
    let media = posts::list_media(&state.pool, post.id).await?;
    Ok(PostView::from_record(post, author.as_ref(), &media))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(PostListQuery),
    responses((status = 200, description = "Fundraising posts"))
)]
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(status) = query.status.as_deref() {
        if !post_status::ALL.contains(&status) {
            return Err(AppError::validation_with(
                "unknown post status",
                json!({"field": "status"}),
            ));
        }
    }
    let page = Page::clamped(query.page, query.limit, 20);
    let (rows, total) =
        posts::list(&state.pool, query.status.as_deref(), query.user_id, page).await?;

    let mut data = Vec::with_capacity(rows.len());
    for post in &rows {
        data.push(post_view(&state, post).await?);
    }
    Ok(Json(json!({
        "data": data,
        "pagination": Pagination::new(page, total),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post with details", body = PostView),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts::get(&state.pool, id).await?;
    Ok(Json(post_view(&state, &post).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    security(("bearer_auth" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostView),
        (status = 403, description = "User not verified", body = ErrorBody)
    )
)]
pub async fn create_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    request: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;

    let new = NewPost {
        user_id: actor.id,
        title: request.title,
        description: request.description,
        amount: request.amount,
        recipient: request.recipient,
        bank: request.bank,
        phone: request.phone,
    };
    let post = state.engine.create_post(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(post_view(&state, &post).await?)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/posts/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated"),
        (status = 403, description = "Not the author", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn update_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    request: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    let post = state
        .engine
        .update_post(
            &actor,
            id,
            request.title.as_deref(),
            request.description.as_deref(),
            request.amount,
            request.recipient.as_deref(),
            request.bank.as_deref(),
            request.phone.as_deref(),
        )
        .await?;
    Ok(Json(json!({
        "id": post.id,
        "title": post.title,
        "updated_at": post.updated_at,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the author", body = ErrorBody)
    )
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.engine.delete_post(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/media",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 201, description = "Media attached", body = PostMediaView),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 415, description = "Unsupported media type", body = ErrorBody)
    )
)]
pub async fn add_media_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // Ownership is checked before accepting the upload.
    state.engine.owned_post(&actor, id).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("media") {
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

        ensure_size(bytes.len(), MAX_MEDIA_BYTES, "10MB")?;
        let media_type = ensure_media(filename.as_deref(), Some(&content_type))?;

        let index = posts::next_media_index(&state.pool, id).await?;
        let key = keys::post_media_key(id, index, &content_type);
        state
            .store
            .put_object(BUCKET_POST_MEDIA, &key, bytes.to_vec(), &content_type)
            .await?;
        let url = keys::object_url(state.store.config(), BUCKET_POST_MEDIA, &key);
        let media = state
            .engine
            .attach_post_media(&actor, id, &url, media_type)
            .await?;
        return Ok((StatusCode::CREATED, Json(PostMediaView::from_record(&media))));
    }
    Err(AppError::validation_with(
        "file not found",
        json!({"field": "media"}),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}/media/{media_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Post id"),
        ("media_id" = i64, Path, description = "Media id")
    ),
    responses(
        (status = 204, description = "Media removed"),
        (status = 403, description = "Not the author", body = ErrorBody)
    )
)]
pub async fn delete_media_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, media_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    state.engine.remove_post_media(&actor, id, media_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
