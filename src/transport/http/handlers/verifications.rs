use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::domain::error::{AppError, ErrorBody};
use crate::storage::repo::verifications::NewVerification;
use crate::storage::repo::Page;
use crate::transport::http::extract::{AdminUser, AuthUser};
use crate::transport::http::types::{
    bad_json, AppState, ReviewVerificationRequest, SubmitVerificationRequest, Pagination,
    VerificationListQuery,
};
use crate::transport::http::views::VerificationView;
use crate::validation::validate;

#[utoipa::path(
    post,
    path = "/api/v1/verifications",
    security(("bearer_auth" = [])),
    request_body = SubmitVerificationRequest,
    responses(
        (status = 201, description = "Verification submitted", body = VerificationView),
        (status = 409, description = "Already submitted", body = ErrorBody)
    )
)]
pub async fn submit_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    request: Result<Json<SubmitVerificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;
    if request.doc_type != "inn" && request.doc_type != "snils" {
        return Err(AppError::validation_with(
            "doc_type must be 'inn' or 'snils'",
            json!({"field": "doc_type"}),
        ));
    }

    let new = NewVerification {
        user_id: actor.id,
        user_photo_url: request.user_photo_url,
        last_name: request.last_name,
        first_name: request.first_name,
        middle_name: request.middle_name,
        birth_date: request.birth_date,
        passport_series: request.passport_series,
        passport_number: request.passport_number,
        passport_issuer: request.passport_issuer,
        passport_date: request.passport_date,
        doc_type: request.doc_type,
        inn: request.inn,
        snils: request.snils,
        passport_scans_urls: request.passport_scans_urls,
        consent1: request.consent1,
        consent2: request.consent2,
        consent3: request.consent3,
    };
    let verification = state.engine.submit_verification(&actor, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(VerificationView::from_record(&verification)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/verifications/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own verification status", body = VerificationView),
        (status = 404, description = "Nothing submitted", body = ErrorBody)
    )
)]
pub async fn my_verification_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let verification = state.engine.my_verification(&actor).await?;
    Ok(Json(VerificationView::from_record(&verification)))
}

#[utoipa::path(
    get,
    path = "/api/v1/verifications",
    security(("bearer_auth" = [])),
    params(VerificationListQuery),
    responses(
        (status = 200, description = "Verification requests (admin)"),
        (status = 403, description = "Admin role required", body = ErrorBody)
    )
)]
pub async fn list_handler(
    State(state): State<AppState>,
    AdminUser(_actor): AdminUser,
    Query(query): Query<VerificationListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::clamped(query.page, query.limit, 20);
    let (rows, total) = crate::storage::repo::verifications::list(
        &state.pool,
        query.status.as_deref(),
        page,
    )
    .await?;
    let data: Vec<VerificationView> = rows.iter().map(VerificationView::from_record).collect();
    Ok(Json(json!({
        "data": data,
        "pagination": Pagination::new(page, total),
    })))
}

#[utoipa::path(
    patch,
    path = "/api/v1/verifications/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Verification id")),
    request_body = ReviewVerificationRequest,
    responses(
        (status = 200, description = "Reviewed", body = VerificationView),
        (status = 403, description = "Admin role required", body = ErrorBody),
        (status = 409, description = "Already reviewed", body = ErrorBody)
    )
)]
pub async fn review_handler(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<i64>,
    request: Result<Json<ReviewVerificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;
    let verification = state
        .engine
        .review_verification(&actor, id, &request.status, request.rejection_reason.as_deref())
        .await?;
    Ok(Json(VerificationView::from_record(&verification)))
}
