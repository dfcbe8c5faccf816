use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::domain::error::{AppError, ErrorBody};
use crate::storage::repo::{ratings, users, Page};
use crate::transport::http::extract::AuthUser;
use crate::transport::http::types::{AppState, PageQuery, Pagination};
use crate::transport::http::views::RatingView;

#[utoipa::path(
    get,
    path = "/api/v1/ratings",
    params(PageQuery),
    responses((status = 200, description = "Leaderboard, points descending"))
)]
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::clamped(query.page, query.limit, 50);
    let (rows, total) = ratings::list_ranked(&state.pool, page).await?;

    let mut data = Vec::with_capacity(rows.len());
    for ranked in &rows {
        let user = users::get(&state.pool, ranked.rating.user_id).await.ok();
        data.push(RatingView::from_record(
            &ranked.rating,
            user.as_ref(),
            ranked.position,
        ));
    }
    Ok(Json(json!({
        "data": data,
        "pagination": Pagination::new(page, total),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/ratings/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own rating with leaderboard position", body = RatingView),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn my_rating_handler(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let (rating, position) = state.engine.my_rating(&actor).await?;
    let user = users::get(&state.pool, actor.id).await.ok();
    Ok(Json(RatingView::from_record(&rating, user.as_ref(), position)))
}
