use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::domain::error::{AppError, ErrorBody};
use crate::domain::model::{donation_status, Donation};
use crate::storage::object::keys::{self, BUCKET_DONATION_RECEIPTS};
use crate::storage::repo::{donations, posts, users, Page};
use crate::transport::http::extract::AuthUser;
use crate::transport::http::types::{
    bad_json, AppState, CreateDonationRequest, DonationListQuery, Pagination,
    ResolveDonationRequest,
};
use crate::transport::http::views::DonationView;
use crate::validation::{ensure_document, ensure_size, validate, MAX_RECEIPT_BYTES};

/// Donation record enriched with donor and post summaries.
async fn donation_view(state: &AppState, donation: &Donation) -> DonationView {
    let donor = users::get(&state.pool, donation.donor_id).await.ok();
    let post = posts::get(&state.pool, donation.post_id).await.ok();
    DonationView::from_record(donation, donor.as_ref(), post.as_ref())
}

#[utoipa::path(
    post,
    path = "/api/v1/donations",
    security(("bearer_auth" = [])),
    request_body = CreateDonationRequest,
    responses(
        (status = 201, description = "Donation pledged", body = DonationView),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn create_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    request: Result<Json<CreateDonationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    let donation = state
        .engine
        .create_donation(&actor, request.post_id, request.amount)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(donation_view(&state, &donation).await),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/donations",
    params(DonationListQuery),
    responses((status = 200, description = "Donations"))
)]
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<DonationListQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(status) = query.status.as_deref() {
        if !donation_status::ALL.contains(&status) {
            return Err(AppError::validation_with(
                "unknown donation status",
                json!({"field": "status"}),
            ));
        }
    }
    let page = Page::clamped(query.page, query.limit, 20);
    let (rows, total) = donations::list(
        &state.pool,
        query.post_id,
        query.donor_id,
        query.status.as_deref(),
        page,
    )
    .await?;

    let mut data = Vec::with_capacity(rows.len());
    for donation in &rows {
        data.push(donation_view(&state, donation).await);
    }
    Ok(Json(json!({
        "data": data,
        "pagination": Pagination::new(page, total),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/donations/{id}",
    params(("id" = i64, Path, description = "Donation id")),
    responses(
        (status = 200, description = "Donation with details", body = DonationView),
        (status = 404, description = "No such donation", body = ErrorBody)
    )
)]
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let donation = donations::get(&state.pool, id).await?;
    Ok(Json(donation_view(&state, &donation).await))
}

#[utoipa::path(
    post,
    path = "/api/v1/donations/{id}/receipt",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Donation id")),
    responses(
        (status = 200, description = "Receipt attached", body = DonationView),
        (status = 403, description = "Not the donor", body = ErrorBody),
        (status = 415, description = "Unsupported media type", body = ErrorBody)
    )
)]
pub async fn upload_receipt_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // Authorize before accepting the upload.
    state.engine.receipt_target(&actor, id).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("receipt") {
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

        ensure_size(bytes.len(), MAX_RECEIPT_BYTES, "10MB")?;
        ensure_document(filename.as_deref(), Some(&content_type))?;

        let key = keys::donation_receipt_key(id, &content_type);
        state
            .store
            .put_object(BUCKET_DONATION_RECEIPTS, &key, bytes.to_vec(), &content_type)
            .await?;
        let url = keys::object_url(state.store.config(), BUCKET_DONATION_RECEIPTS, &key);
        let donation = state.engine.attach_receipt(&actor, id, &url).await?;
        return Ok(Json(donation_view(&state, &donation).await));
    }
    Err(AppError::validation_with(
        "file not found",
        json!({"field": "receipt"}),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/donations/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Donation id")),
    request_body = ResolveDonationRequest,
    responses(
        (status = 200, description = "Donation resolved"),
        (status = 403, description = "Not the post author or an admin", body = ErrorBody),
        (status = 409, description = "Donation is not pending", body = ErrorBody)
    )
)]
pub async fn resolve_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    request: Result<Json<ResolveDonationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request.map_err(bad_json)?;
    validate(&request)?;
    let donation = state
        .engine
        .resolve_donation(&actor, id, &request.status)
        .await?;
    Ok(Json(json!({
        "id": donation.id,
        "status": donation.status,
        "confirmed_at": donation.confirmed_at,
        "confirmed_by": donation.confirmed_by,
    })))
}
