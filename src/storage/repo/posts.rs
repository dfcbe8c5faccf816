use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};

use crate::domain::error::AppError;
use crate::domain::model::{Post, PostMedia};
use crate::storage::repo::Page;

const COLUMNS: &str = "id, user_id, title, description, amount, collected, recipient, bank, \
                       phone, status, created_at, updated_at, is_editable";

pub struct NewPost {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub amount: Decimal,
    pub recipient: String,
    pub bank: String,
    pub phone: String,
}

pub async fn create(pool: &PgPool, p: &NewPost) -> Result<Post, AppError> {
    let query = format!(
        "INSERT INTO posts (user_id, title, description, amount, recipient, bank, phone) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
    );
    let post = sqlx::query_as::<_, Post>(&query)
        .bind(p.user_id)
        .bind(&p.title)
        .bind(&p.description)
        .bind(p.amount)
        .bind(&p.recipient)
        .bind(&p.bank)
        .bind(&p.phone)
        .fetch_one(pool)
        .await?;
    Ok(post)
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Post, AppError> {
    let query = format!("SELECT {COLUMNS} FROM posts WHERE id = $1");
    sqlx::query_as::<_, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("post"))
}

pub async fn list(
    pool: &PgPool,
    status: Option<&str>,
    user_id: Option<i64>,
    page: Page,
) -> Result<(Vec<Post>, i64), AppError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM posts WHERE 1=1");
    if let Some(status) = status {
        count.push(" AND status = ").push_bind(status);
    }
    if let Some(user_id) = user_id {
        count.push(" AND user_id = ").push_bind(user_id);
    }
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM posts WHERE 1=1"));
    if let Some(status) = status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(user_id) = user_id {
        query.push(" AND user_id = ").push_bind(user_id);
    }
    query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = query.build_query_as::<Post>().fetch_all(pool).await?;
    Ok((rows, total))
}

/// Partial update of the editable field set. `collected` and `status` are
/// deliberately not reachable from here.
#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    amount: Option<Decimal>,
    recipient: Option<&str>,
    bank: Option<&str>,
    phone: Option<&str>,
) -> Result<Post, AppError> {
    let query = format!(
        "UPDATE posts SET \
            title = COALESCE($2, title), \
            description = COALESCE($3, description), \
            amount = COALESCE($4, amount), \
            recipient = COALESCE($5, recipient), \
            bank = COALESCE($6, bank), \
            phone = COALESCE($7, phone), \
            updated_at = now() \
         WHERE id = $1 RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Post>(&query)
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(amount)
        .bind(recipient)
        .bind(bank)
        .bind(phone)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("post"))
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("post"));
    }
    Ok(())
}

// ----- media -----

pub async fn create_media(
    pool: &PgPool,
    post_id: i64,
    media_url: &str,
    media_type: &str,
    order_index: i32,
) -> Result<PostMedia, AppError> {
    let media = sqlx::query_as::<_, PostMedia>(
        "INSERT INTO post_media (post_id, media_url, media_type, order_index) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, post_id, media_url, media_type, order_index, created_at",
    )
    .bind(post_id)
    .bind(media_url)
    .bind(media_type)
    .bind(order_index)
    .fetch_one(pool)
    .await?;
    Ok(media)
}

/// Ordered attachments; ties on order_index break by insertion order.
pub async fn list_media(pool: &PgPool, post_id: i64) -> Result<Vec<PostMedia>, AppError> {
    let media = sqlx::query_as::<_, PostMedia>(
        "SELECT id, post_id, media_url, media_type, order_index, created_at \
         FROM post_media WHERE post_id = $1 ORDER BY order_index, id",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    Ok(media)
}

pub async fn next_media_index(pool: &PgPool, post_id: i64) -> Result<i32, AppError> {
    let max: Option<i32> =
        sqlx::query_scalar("SELECT MAX(order_index) FROM post_media WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(pool)
            .await?;
    Ok(max.map_or(0, |m| m + 1))
}

pub async fn get_media(pool: &PgPool, post_id: i64, media_id: i64) -> Result<PostMedia, AppError> {
    sqlx::query_as::<_, PostMedia>(
        "SELECT id, post_id, media_url, media_type, order_index, created_at \
         FROM post_media WHERE id = $1 AND post_id = $2",
    )
    .bind(media_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("media"))
}

pub async fn delete_media(pool: &PgPool, post_id: i64, media_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM post_media WHERE id = $1 AND post_id = $2")
        .bind(media_id)
        .bind(post_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("media"));
    }
    Ok(())
}
