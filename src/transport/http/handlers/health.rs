use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::storage::object::keys::BUCKET_USER_PHOTOS;
use crate::transport::http::types::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database and object store reachable"),
        (status = 503, description = "One or more dependencies unreachable")
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let storage_ok = state.store.bucket_exists(BUCKET_USER_PHOTOS).await;

    let status = if database_ok && storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ok" } else { "degraded" },
            "timestamp": Utc::now().to_rfc3339(),
            "database": if database_ok { "connected" } else { "error" },
            "object_storage": if storage_ok { "connected" } else { "error" },
        })),
    )
}
