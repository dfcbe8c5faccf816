use sqlx::PgPool;

use crate::domain::error::AppError;
use crate::domain::model::User;

const COLUMNS: &str = "id, phone, password_hash, first_name, last_name, photo_url, role, \
                       helper_name, created_at, updated_at, is_active";

pub async fn create(
    pool: &PgPool,
    phone: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User, AppError> {
    let query = format!(
        "INSERT INTO users (phone, password_hash, first_name, last_name) \
         VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, User>(&query)
        .bind(phone)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::conflict("a user with this phone number already exists")
            }
            other => other,
        })
}

pub async fn get(pool: &PgPool, id: i64) -> Result<User, AppError> {
    let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("user"))
}

pub async fn get_by_phone(pool: &PgPool, phone: &str) -> Result<User, AppError> {
    let query = format!("SELECT {COLUMNS} FROM users WHERE phone = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(phone)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("user"))
}

/// Partial profile update; absent fields keep their current value.
pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    first_name: Option<&str>,
    last_name: Option<&str>,
    helper_name: Option<&str>,
) -> Result<User, AppError> {
    let query = format!(
        "UPDATE users SET \
            first_name = COALESCE($2, first_name), \
            last_name = COALESCE($3, last_name), \
            helper_name = COALESCE($4, helper_name), \
            updated_at = now() \
         WHERE id = $1 RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(helper_name)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("user"))
}

pub async fn set_photo_url(pool: &PgPool, id: i64, photo_url: &str) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET photo_url = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(photo_url)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("user"));
    }
    Ok(())
}

pub async fn set_password_hash(pool: &PgPool, id: i64, password_hash: &str) -> Result<(), AppError> {
    let result =
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("user"));
    }
    Ok(())
}
