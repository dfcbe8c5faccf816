use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};

use crate::domain::error::AppError;
use crate::domain::model::Donation;
use crate::storage::repo::Page;

const COLUMNS: &str = "id, post_id, donor_id, amount, receipt_url, status, confirmed_at, \
                       confirmed_by, created_at";

pub async fn create(
    pool: &PgPool,
    post_id: i64,
    donor_id: i64,
    amount: Decimal,
) -> Result<Donation, AppError> {
    let query = format!(
        "INSERT INTO donations (post_id, donor_id, amount) \
         VALUES ($1, $2, $3) RETURNING {COLUMNS}"
    );
    let donation = sqlx::query_as::<_, Donation>(&query)
        .bind(post_id)
        .bind(donor_id)
        .bind(amount)
        .fetch_one(pool)
        .await?;
    Ok(donation)
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Donation, AppError> {
    let query = format!("SELECT {COLUMNS} FROM donations WHERE id = $1");
    sqlx::query_as::<_, Donation>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("donation"))
}

pub async fn list(
    pool: &PgPool,
    post_id: Option<i64>,
    donor_id: Option<i64>,
    status: Option<&str>,
    page: Page,
) -> Result<(Vec<Donation>, i64), AppError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM donations WHERE 1=1");
    if let Some(post_id) = post_id {
        count.push(" AND post_id = ").push_bind(post_id);
    }
    if let Some(donor_id) = donor_id {
        count.push(" AND donor_id = ").push_bind(donor_id);
    }
    if let Some(status) = status {
        count.push(" AND status = ").push_bind(status);
    }
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM donations WHERE 1=1"));
    if let Some(post_id) = post_id {
        query.push(" AND post_id = ").push_bind(post_id);
    }
    if let Some(donor_id) = donor_id {
        query.push(" AND donor_id = ").push_bind(donor_id);
    }
    if let Some(status) = status {
        query.push(" AND status = ").push_bind(status);
    }
    query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = query.build_query_as::<Donation>().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn set_receipt_url(
    pool: &PgPool,
    id: i64,
    receipt_url: &str,
) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE donations SET receipt_url = $2 WHERE id = $1")
        .bind(id)
        .bind(receipt_url)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("donation"));
    }
    Ok(())
}
