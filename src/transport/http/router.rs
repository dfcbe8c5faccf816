use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::error::{ErrorBody, ErrorDetail};
use crate::transport::http::handlers::{
    auth, chats, donations, files, health, posts, ratings, users, verifications,
};
use crate::transport::http::types::{
    ChangePasswordRequest, CreateChatRequest, CreateDonationRequest, CreatePostRequest,
    LoginRequest, MarkMessagesReadRequest, Pagination, PresignDownloadRequest,
    PresignUploadRequest, RegisterRequest, ResolveDonationRequest, ReviewVerificationRequest,
    SubmitVerificationRequest, UpdateMessageRequest, UpdatePostRequest, UpdateProfileRequest,
};
use crate::transport::http::views::{
    ChatView, DonationView, MessageView, PostInfo, PostMediaView, PostView, ProfileView,
    RatingView, UserInfo, VerificationView,
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        auth::register_handler,
        auth::login_handler,
        auth::refresh_handler,
        users::get_profile_handler,
        users::update_profile_handler,
        users::upload_photo_handler,
        users::change_password_handler,
        verifications::submit_handler,
        verifications::my_verification_handler,
        verifications::list_handler,
        verifications::review_handler,
        posts::list_handler,
        posts::get_handler,
        posts::create_handler,
        posts::update_handler,
        posts::delete_handler,
        posts::add_media_handler,
        posts::delete_media_handler,
        donations::create_handler,
        donations::list_handler,
        donations::get_handler,
        donations::upload_receipt_handler,
        donations::resolve_handler,
        chats::list_handler,
        chats::create_handler,
        chats::list_messages_handler,
        chats::send_message_handler,
        chats::mark_read_handler,
        chats::update_message_handler,
        chats::delete_message_handler,
        ratings::list_handler,
        ratings::my_rating_handler,
        files::presign_upload_handler,
        files::presign_download_handler,
        files::get_file_handler
    ),
    components(schemas(
        ErrorBody,
        ErrorDetail,
        Pagination,
        RegisterRequest,
        LoginRequest,
        UpdateProfileRequest,
        ChangePasswordRequest,
        SubmitVerificationRequest,
        ReviewVerificationRequest,
        CreatePostRequest,
        UpdatePostRequest,
        CreateDonationRequest,
        ResolveDonationRequest,
        CreateChatRequest,
        MarkMessagesReadRequest,
        UpdateMessageRequest,
        PresignUploadRequest,
        PresignDownloadRequest,
        ProfileView,
        UserInfo,
        VerificationView,
        PostView,
        PostInfo,
        PostMediaView,
        DonationView,
        ChatView,
        MessageView,
        RatingView
    )),
    modifiers(&BearerAuth)
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route(
            "/users/me",
            get(users::get_profile_handler).patch(users::update_profile_handler),
        )
        .route("/users/me/photo", post(users::upload_photo_handler))
        .route(
            "/users/me/change-password",
            post(users::change_password_handler),
        )
        .route(
            "/verifications",
            post(verifications::submit_handler).get(verifications::list_handler),
        )
        .route("/verifications/me", get(verifications::my_verification_handler))
        .route("/verifications/:id", patch(verifications::review_handler))
        .route("/posts", get(posts::list_handler).post(posts::create_handler))
        .route(
            "/posts/:id",
            get(posts::get_handler)
                .patch(posts::update_handler)
                .delete(posts::delete_handler),
        )
        .route("/posts/:id/media", post(posts::add_media_handler))
        .route(
            "/posts/:id/media/:media_id",
            delete(posts::delete_media_handler),
        )
        .route(
            "/donations",
            get(donations::list_handler).post(donations::create_handler),
        )
        .route(
            "/donations/:id",
            get(donations::get_handler).patch(donations::resolve_handler),
        )
        .route(
            "/donations/:id/receipt",
            post(donations::upload_receipt_handler),
        )
        .route("/chats", get(chats::list_handler).post(chats::create_handler))
        .route(
            "/chats/:id/messages",
            get(chats::list_messages_handler).post(chats::send_message_handler),
        )
        .route("/chats/:id/messages/read", patch(chats::mark_read_handler))
        .route(
            "/chats/:id/messages/:message_id",
            patch(chats::update_message_handler).delete(chats::delete_message_handler),
        )
        .route("/ratings", get(ratings::list_handler))
        .route("/ratings/me", get(ratings::my_rating_handler))
        .route("/upload/presigned-url", post(files::presign_upload_handler))
        .route("/files/presigned-url", post(files::presign_download_handler));

    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/files/:bucket/*object_key", get(files::get_file_handler))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .with_state(app_state)
}
