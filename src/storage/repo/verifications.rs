use sqlx::{PgPool, QueryBuilder};

use crate::domain::error::AppError;
use crate::domain::model::Verification;
use crate::storage::repo::Page;

const COLUMNS: &str = "id, user_id, user_photo_url, last_name, first_name, middle_name, \
                       birth_date, passport_series, passport_number, passport_issuer, \
                       passport_date, doc_type, inn, snils, passport_scans_urls, \
                       consent1, consent2, consent3, status, submitted_at, reviewed_at, \
                       reviewed_by, rejection_reason";

/// Insert payload for a new verification request.
pub struct NewVerification {
    pub user_id: i64,
    pub user_photo_url: Option<String>,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub birth_date: chrono::NaiveDate,
    pub passport_series: String,
    pub passport_number: String,
    pub passport_issuer: String,
    pub passport_date: chrono::NaiveDate,
    pub doc_type: String,
    pub inn: Option<String>,
    pub snils: Option<String>,
    pub passport_scans_urls: Vec<String>,
    pub consent1: bool,
    pub consent2: bool,
    pub consent3: bool,
}

pub async fn create(pool: &PgPool, v: &NewVerification) -> Result<Verification, AppError> {
    let query = format!(
        "INSERT INTO verifications \
            (user_id, user_photo_url, last_name, first_name, middle_name, birth_date, \
             passport_series, passport_number, passport_issuer, passport_date, \
             doc_type, inn, snils, passport_scans_urls, consent1, consent2, consent3) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Verification>(&query)
        .bind(v.user_id)
        .bind(&v.user_photo_url)
        .bind(&v.last_name)
        .bind(&v.first_name)
        .bind(&v.middle_name)
        .bind(v.birth_date)
        .bind(&v.passport_series)
        .bind(&v.passport_number)
        .bind(&v.passport_issuer)
        .bind(v.passport_date)
        .bind(&v.doc_type)
        .bind(&v.inn)
        .bind(&v.snils)
        .bind(&v.passport_scans_urls)
        .bind(v.consent1)
        .bind(v.consent2)
        .bind(v.consent3)
        .fetch_one(pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::conflict("a verification request has already been submitted")
            }
            other => other,
        })
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Verification, AppError> {
    let query = format!("SELECT {COLUMNS} FROM verifications WHERE id = $1");
    sqlx::query_as::<_, Verification>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("verification"))
}

pub async fn get_by_user(pool: &PgPool, user_id: i64) -> Result<Verification, AppError> {
    let query = format!("SELECT {COLUMNS} FROM verifications WHERE user_id = $1");
    sqlx::query_as::<_, Verification>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("verification"))
}

pub async fn exists_for_user(pool: &PgPool, user_id: i64) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verifications WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn is_user_approved(pool: &PgPool, user_id: i64) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM verifications WHERE user_id = $1 AND status = 'approved'",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn list(
    pool: &PgPool,
    status: Option<&str>,
    page: Page,
) -> Result<(Vec<Verification>, i64), AppError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM verifications WHERE 1=1");
    if let Some(status) = status {
        count.push(" AND status = ").push_bind(status);
    }
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM verifications WHERE 1=1"));
    if let Some(status) = status {
        query.push(" AND status = ").push_bind(status);
    }
    query
        .push(" ORDER BY submitted_at DESC LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = query
        .build_query_as::<Verification>()
        .fetch_all(pool)
        .await?;
    Ok((rows, total))
}

/// Conditional transition out of `pending`, stamping the reviewer. Returns the
/// number of rows moved (0 means the row was absent or already reviewed).
pub async fn review(
    pool: &PgPool,
    id: i64,
    status: &str,
    reviewed_by: i64,
    rejection_reason: Option<&str>,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE verifications \
         SET status = $2, reviewed_at = now(), reviewed_by = $3, rejection_reason = $4 \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .bind(status)
    .bind(reviewed_by)
    .bind(rejection_reason)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
