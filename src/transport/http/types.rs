//! Shared HTTP state and request/response DTOs.

use axum::extract::rejection::JsonRejection;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::app::engine::LifecycleEngine;
use crate::domain::error::AppError;
use crate::infra::config::Config;
use crate::storage::object::ObjectStore;
use crate::storage::repo::Page;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub engine: LifecycleEngine,
    pub store: ObjectStore,
    pub config: Arc<Config>,
}

/// Folds an axum JSON-body rejection into the error envelope (422).
pub fn bad_json(err: JsonRejection) -> AppError {
    AppError::Unprocessable(format!("invalid JSON body: {}", err))
}

// ----- auth -----

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "required"))]
    pub phone: String,
    #[validate(length(min = 6, message = "minimum length is 6"))]
    pub password: String,
    #[validate(length(min = 1, message = "required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "required"))]
    pub last_name: String,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub helper_name: Option<String>,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "required"))]
    pub old_password: String,
    #[validate(length(min = 6, message = "minimum length is 6"))]
    pub new_password: String,
}

// ----- verifications -----

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct SubmitVerificationRequest {
    #[validate(length(min = 1, message = "required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "required"))]
    pub first_name: String,
    pub middle_name: Option<String>,
    pub birth_date: NaiveDate,
    #[validate(length(min = 1, message = "required"))]
    pub passport_series: String,
    #[validate(length(min = 1, message = "required"))]
    pub passport_number: String,
    #[validate(length(min = 1, message = "required"))]
    pub passport_issuer: String,
    pub passport_date: NaiveDate,
    /// `inn` or `snils`.
    #[validate(length(min = 1, message = "required"))]
    pub doc_type: String,
    pub inn: Option<String>,
    pub snils: Option<String>,
    /// Reference to a photo uploaded beforehand via the presigned flow.
    pub user_photo_url: Option<String>,
    /// At least two passport pages, uploaded beforehand.
    #[validate(length(min = 2, message = "at least 2 passport scans are required"))]
    pub passport_scans_urls: Vec<String>,
    #[serde(default)]
    pub consent1: bool,
    #[serde(default)]
    pub consent2: bool,
    #[serde(default)]
    pub consent3: bool,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct ReviewVerificationRequest {
    /// `approved` or `rejected`.
    #[validate(length(min = 1, message = "required"))]
    pub status: String,
    pub rejection_reason: Option<String>,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VerificationListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ----- posts -----

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 500, message = "required, up to 500 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "required"))]
    pub description: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[validate(length(min = 1, message = "required"))]
    pub recipient: String,
    #[validate(length(min = 1, message = "required"))]
    pub bank: String,
    #[validate(length(min = 1, message = "required"))]
    pub phone: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    pub recipient: Option<String>,
    pub bank: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListQuery {
    pub status: Option<String>,
    pub user_id: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ----- donations -----

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateDonationRequest {
    pub post_id: i64,
    #[schema(value_type = f64)]
    pub amount: Decimal,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct ResolveDonationRequest {
    /// `confirmed` or `rejected`.
    #[validate(length(min = 1, message = "required"))]
    pub status: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DonationListQuery {
    pub post_id: Option<i64>,
    pub donor_id: Option<i64>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ----- chats -----

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateChatRequest {
    pub post_id: i64,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct MarkMessagesReadRequest {
    #[serde(default)]
    pub message_ids: Vec<i64>,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct UpdateMessageRequest {
    #[validate(length(min = 1, message = "required"))]
    pub text: String,
}

// ----- files -----

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct PresignUploadRequest {
    #[validate(length(min = 1, message = "required"))]
    pub bucket: String,
    #[validate(length(min = 1, message = "required"))]
    pub object_key: String,
    #[validate(length(min = 1, message = "required"))]
    pub content_type: String,
    /// Seconds; defaults to 1 hour, capped at 7 days.
    #[validate(range(min = 1, max = 604800))]
    pub expires_in: Option<u64>,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct PresignDownloadRequest {
    #[validate(length(min = 1, message = "required"))]
    pub bucket: String,
    #[validate(length(min = 1, message = "required"))]
    pub object_key: String,
    #[validate(range(min = 1, max = 604800))]
    pub expires_in: Option<u64>,
}

// ----- pagination -----

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: Page, total: i64) -> Self {
        Pagination {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: page.total_pages(total),
        }
    }
}
