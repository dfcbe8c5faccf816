use sqlx::PgPool;

use crate::domain::error::AppError;
use crate::domain::model::Rating;
use crate::storage::repo::Page;

const COLUMNS: &str = "id, user_id, points, total_donated, updated_at";

/// Fetches the user's rating, creating the zeroed row on first access.
pub async fn get_or_create(pool: &PgPool, user_id: i64) -> Result<Rating, AppError> {
    sqlx::query("INSERT INTO ratings (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;
    let query = format!("SELECT {COLUMNS} FROM ratings WHERE user_id = $1");
    let rating = sqlx::query_as::<_, Rating>(&query)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(rating)
}

/// A leaderboard row with its rank. `RANK()` implements the documented tie
/// policy directly: tied users share a position.
#[derive(Debug, sqlx::FromRow)]
pub struct RankedRating {
    #[sqlx(flatten)]
    pub rating: Rating,
    pub position: i64,
}

/// Leaderboard page: points descending, user id ascending for a stable order
/// among ties.
pub async fn list_ranked(pool: &PgPool, page: Page) -> Result<(Vec<RankedRating>, i64), AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings")
        .fetch_one(pool)
        .await?;
    let query = format!(
        "SELECT {COLUMNS}, RANK() OVER (ORDER BY points DESC) AS position \
         FROM ratings ORDER BY points DESC, user_id ASC LIMIT $1 OFFSET $2"
    );
    let rows = sqlx::query_as::<_, RankedRating>(&query)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(pool)
        .await?;
    Ok((rows, total))
}

/// Leaderboard rank: the count of users with strictly greater points, plus
/// one. Tied users therefore share a position.
pub async fn position(pool: &PgPool, user_id: i64) -> Result<i64, AppError> {
    let position: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) + 1 FROM ratings \
         WHERE points > COALESCE((SELECT points FROM ratings WHERE user_id = $1), 0)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(position)
}
