use sqlx::PgPool;

use crate::domain::error::AppError;
use crate::domain::model::Chat;

const COLUMNS: &str = "id, post_id, helper_id, needy_id, created_at, updated_at";

pub async fn create(
    pool: &PgPool,
    post_id: i64,
    helper_id: i64,
    needy_id: i64,
) -> Result<Chat, AppError> {
    let query = format!(
        "INSERT INTO chats (post_id, helper_id, needy_id) \
         VALUES ($1, $2, $3) RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Chat>(&query)
        .bind(post_id)
        .bind(helper_id)
        .bind(needy_id)
        .fetch_one(pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::conflict("chat already exists for this post"),
            other => other,
        })
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Chat, AppError> {
    let query = format!("SELECT {COLUMNS} FROM chats WHERE id = $1");
    sqlx::query_as::<_, Chat>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("chat"))
}

/// All chats the user participates in, most recently active first.
pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Chat>, AppError> {
    let query = format!(
        "SELECT {COLUMNS} FROM chats WHERE helper_id = $1 OR needy_id = $1 \
         ORDER BY updated_at DESC"
    );
    let chats = sqlx::query_as::<_, Chat>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(chats)
}

pub async fn touch(pool: &PgPool, id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE chats SET updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
