use sqlx::PgPool;

use crate::domain::error::AppError;
use crate::domain::model::Message;
use crate::storage::repo::Page;

const COLUMNS: &str = "id, chat_id, sender_id, text, attachment_url, is_read, is_edited, \
                       created_at, updated_at";

pub async fn create(
    pool: &PgPool,
    chat_id: i64,
    sender_id: i64,
    text: Option<&str>,
    attachment_url: Option<&str>,
) -> Result<Message, AppError> {
    let query = format!(
        "INSERT INTO messages (chat_id, sender_id, text, attachment_url) \
         VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    );
    let message = sqlx::query_as::<_, Message>(&query)
        .bind(chat_id)
        .bind(sender_id)
        .bind(text)
        .bind(attachment_url)
        .fetch_one(pool)
        .await?;
    Ok(message)
}

pub async fn get(pool: &PgPool, chat_id: i64, id: i64) -> Result<Message, AppError> {
    let query = format!("SELECT {COLUMNS} FROM messages WHERE id = $1 AND chat_id = $2");
    sqlx::query_as::<_, Message>(&query)
        .bind(id)
        .bind(chat_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("message"))
}

/// One page of messages, returned oldest-first within the page.
pub async fn list(
    pool: &PgPool,
    chat_id: i64,
    page: Page,
) -> Result<(Vec<Message>, i64), AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_id = $1")
        .bind(chat_id)
        .fetch_one(pool)
        .await?;

    let query = format!(
        "SELECT {COLUMNS} FROM messages WHERE chat_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
    );
    let mut messages = sqlx::query_as::<_, Message>(&query)
        .bind(chat_id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(pool)
        .await?;
    messages.reverse();
    Ok((messages, total))
}

pub async fn set_attachment_url(
    pool: &PgPool,
    id: i64,
    attachment_url: &str,
) -> Result<(), AppError> {
    sqlx::query("UPDATE messages SET attachment_url = $2 WHERE id = $1")
        .bind(id)
        .bind(attachment_url)
        .execute(pool)
        .await?;
    Ok(())
}

/// Marks messages as read. With an explicit id list only those messages are
/// touched; otherwise every unread message in the chat not sent by `reader_id`
/// is marked. Returns the number of rows updated.
pub async fn mark_read(
    pool: &PgPool,
    chat_id: i64,
    reader_id: i64,
    message_ids: &[i64],
) -> Result<u64, AppError> {
    let result = if message_ids.is_empty() {
        sqlx::query(
            "UPDATE messages SET is_read = true \
             WHERE chat_id = $1 AND sender_id <> $2 AND is_read = false",
        )
        .bind(chat_id)
        .bind(reader_id)
        .execute(pool)
        .await?
    } else {
        sqlx::query(
            "UPDATE messages SET is_read = true \
             WHERE chat_id = $1 AND sender_id <> $2 AND id = ANY($3)",
        )
        .bind(chat_id)
        .bind(reader_id)
        .bind(message_ids)
        .execute(pool)
        .await?
    };
    Ok(result.rows_affected())
}

pub async fn update_text(pool: &PgPool, id: i64, text: &str) -> Result<Message, AppError> {
    let query = format!(
        "UPDATE messages SET text = $2, is_edited = true, updated_at = now() \
         WHERE id = $1 RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Message>(&query)
        .bind(id)
        .bind(text)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("message"))
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("message"));
    }
    Ok(())
}

pub async fn last_message(pool: &PgPool, chat_id: i64) -> Result<Option<Message>, AppError> {
    let query = format!(
        "SELECT {COLUMNS} FROM messages WHERE chat_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT 1"
    );
    let message = sqlx::query_as::<_, Message>(&query)
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;
    Ok(message)
}

/// Unread messages addressed to `user_id` (i.e. sent by the counterpart).
pub async fn unread_count(pool: &PgPool, chat_id: i64, user_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM messages \
         WHERE chat_id = $1 AND sender_id <> $2 AND is_read = false",
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
