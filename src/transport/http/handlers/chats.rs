use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::domain::error::{AppError, ErrorBody};
use crate::storage::object::keys::{self, BUCKET_CHAT_ATTACHMENTS};
use crate::storage::repo::{messages, posts, users, Page};
use crate::transport::http::extract::AuthUser;
use crate::transport::http::types::{
    bad_json, AppState, CreateChatRequest, MarkMessagesReadRequest, PageQuery, Pagination,
    UpdateMessageRequest,
};
use crate::transport::http::views::{ChatView, MessageView, PostView};
use crate::validation::{ensure_image, ensure_size, validate, MAX_ATTACHMENT_BYTES};

#[utoipa::path(
    get,
    path = "/api/v1/chats",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "The caller's chats"))
)]
pub async fn list_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let chats = crate::storage::repo::chats::list_for_user(&state.pool, actor.id).await?;

    let mut data = Vec::with_capacity(chats.len());
    for chat in &chats {
        let post = posts::get(&state.pool, chat.post_id).await.ok();
        let post_view = match &post {
            Some(post) => {
                let author = users::get(&state.pool, post.user_id).await.ok();
                Some(PostView::from_record(post, author.as_ref(), &[]))
            }
            None => None,
        };

        let interlocutor_id = if chat.helper_id == actor.id {
            chat.needy_id
        } else {
            chat.helper_id
        };
        let interlocutor = users::get(&state.pool, interlocutor_id).await.ok();

        let last_message = match messages::last_message(&state.pool, chat.id).await? {
            Some(message) => {
                let sender = users::get(&state.pool, message.sender_id).await.ok();
                Some(MessageView::from_record(&message, sender.as_ref()))
            }
            None => None,
        };
        let unread = messages::unread_count(&state.pool, chat.id, actor.id).await?;

        data.push(ChatView::from_record(
            chat,
            post_view,
            interlocutor.as_ref(),
            last_message,
            unread,
        ));
    }
    Ok(Json(json!({ "data": data })))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats",
    security(("bearer_auth" = [])),
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "Chat opened"),
        (status = 409, description = "Chat already exists", body = ErrorBody),
        (status = 422, description = "Cannot chat with yourself", body = ErrorBody)
    )
)]
pub async fn create_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    request: Result<Json<CreateChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    let chat = state.engine.open_chat(&actor, request.post_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": chat.id,
            "post_id": chat.post_id,
            "helper_id": chat.helper_id,
            "needy_id": chat.needy_id,
            "created_at": chat.created_at,
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/chats/{id}/messages",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Chat id"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Messages, oldest first within the page"),
        (status = 403, description = "Not a participant", body = ErrorBody)
    )
)]
pub async fn list_messages_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.engine.member_chat(&actor, id).await?;
    let page = Page::clamped(query.page, query.limit, 50);
    let (rows, total) = messages::list(&state.pool, id, page).await?;

    let mut data = Vec::with_capacity(rows.len());
    for message in &rows {
        let sender = users::get(&state.pool, message.sender_id).await.ok();
        data.push(MessageView::from_record(message, sender.as_ref()));
    }
    Ok(Json(json!({
        "data": data,
        "pagination": Pagination::new(page, total),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/{id}/messages",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Chat id")),
    responses(
        (status = 201, description = "Message sent", body = MessageView),
        (status = 400, description = "Text or attachment required", body = ErrorBody)
    )
)]
pub async fn send_message_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut text: Option<String> = None;
    let mut attachment: Option<(Option<String>, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("text") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("failed to read field: {e}")))?;
                if !value.is_empty() {
                    text = Some(value);
                }
            }
            Some("attachment") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("failed to read upload: {e}")))?;
                ensure_size(bytes.len(), MAX_ATTACHMENT_BYTES, "5MB")?;
                ensure_image(filename.as_deref(), Some(&content_type))?;
                attachment = Some((filename, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let message = state
        .engine
        .send_message(&actor, id, text.as_deref(), attachment.is_some())
        .await?;

    let message = if let Some((_filename, content_type, bytes)) = attachment {
        let key = keys::chat_attachment_key(id, message.id, &content_type);
        match state
            .store
            .put_object(BUCKET_CHAT_ATTACHMENTS, &key, bytes, &content_type)
            .await
        {
            Ok(()) => {
                let url = keys::object_url(state.store.config(), BUCKET_CHAT_ATTACHMENTS, &key);
                state.engine.set_message_attachment(id, message.id, &url).await?
            }
            Err(err) => {
                // The upload failed; drop the placeholder message rather than
                // leaving an attachment-less shell behind.
                let _ = messages::delete(&state.pool, message.id).await;
                return Err(err);
            }
        }
    } else {
        message
    };

    let sender = users::get(&state.pool, message.sender_id).await.ok();
    Ok((
        StatusCode::CREATED,
        Json(MessageView::from_record(&message, sender.as_ref())),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/chats/{id}/messages/read",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Chat id")),
    request_body = MarkMessagesReadRequest,
    responses((status = 200, description = "Messages marked read"))
)]
pub async fn mark_read_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    request: Option<Json<MarkMessagesReadRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let message_ids = request.map(|Json(r)| r.message_ids).unwrap_or_default();
    let updated = state
        .engine
        .mark_messages_read(&actor, id, &message_ids)
        .await?;
    Ok(Json(json!({
        "updated_count": updated,
        "message": "messages marked as read",
    })))
}

#[utoipa::path(
    patch,
    path = "/api/v1/chats/{id}/messages/{message_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Chat id"),
        ("message_id" = i64, Path, description = "Message id")
    ),
    request_body = UpdateMessageRequest,
    responses(
        (status = 200, description = "Message edited", body = MessageView),
        (status = 403, description = "Only the sender may edit", body = ErrorBody)
    )
)]
pub async fn update_message_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, message_id)): Path<(i64, i64)>,
    request: Result<Json<UpdateMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;
    let message = state
        .engine
        .edit_message(&actor, id, message_id, &request.text)
        .await?;
    Ok(Json(json!({
        "id": message.id,
        "text": message.text,
        "is_edited": message.is_edited,
        "updated_at": message.updated_at,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/chats/{id}/messages/{message_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Chat id"),
        ("message_id" = i64, Path, description = "Message id")
    ),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 403, description = "Only the sender may delete", body = ErrorBody)
    )
)]
pub async fn delete_message_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, message_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    state.engine.delete_message(&actor, id, message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
