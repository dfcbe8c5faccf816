//! Entity records as stored in PostgreSQL.
//!
//! Status fields are kept as strings in the rows (the database constrains the
//! value sets with CHECKs); the constants below are the single source for the
//! allowed values on the Rust side.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

pub mod role {
    pub const USER: &str = "user";
    pub const HELPER: &str = "helper";
    pub const NEEDY: &str = "needy";
    pub const ADMIN: &str = "admin";
}

pub mod verification_status {
    pub const PENDING: &str = "pending";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
}

pub mod post_status {
    pub const ACTIVE: &str = "active";
    pub const COMPLETED: &str = "completed";
    pub const CLOSED: &str = "closed";
    pub const MODERATED: &str = "moderated";

    pub const ALL: &[&str] = &[ACTIVE, COMPLETED, CLOSED, MODERATED];
}

pub mod donation_status {
    pub const PENDING: &str = "pending";
    pub const CONFIRMED: &str = "confirmed";
    pub const REJECTED: &str = "rejected";

    pub const ALL: &[&str] = &[PENDING, CONFIRMED, REJECTED];
}

pub mod media_type {
    pub const IMAGE: &str = "image";
    pub const VIDEO: &str = "video";
}

/// The authenticated actor, extracted from the bearer token and threaded
/// explicitly through every guarded operation.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i64,
    pub role: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == role::ADMIN
    }
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl User {
    /// Display name shown to other users; helpers may publish an alias.
    pub fn display_name(&self) -> String {
        match &self.helper_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Verification {
    pub id: i64,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_photo_url: Option<String>,
    pub last_name: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub birth_date: NaiveDate,
    pub passport_series: String,
    pub passport_number: String,
    pub passport_issuer: String,
    pub passport_date: NaiveDate,
    pub doc_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snils: Option<String>,
    pub passport_scans_urls: Vec<String>,
    pub consent1: bool,
    pub consent2: bool,
    pub consent3: bool,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[schema(value_type = f64)]
    pub collected: Decimal,
    pub recipient: String,
    pub bank: String,
    pub phone: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_editable: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct PostMedia {
    pub id: i64,
    pub post_id: i64,
    pub media_url: String,
    pub media_type: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Donation {
    pub id: i64,
    pub post_id: i64,
    pub donor_id: i64,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Chat {
    pub id: i64,
    pub post_id: i64,
    pub helper_id: i64,
    pub needy_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    pub is_read: bool,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived reputation state. The tier label is intentionally absent: it is a
/// pure function of `points` (see `domain::rating`) and is computed on the way
/// out, never stored.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub points: i64,
    #[schema(value_type = f64)]
    pub total_donated: Decimal,
    pub updated_at: DateTime<Utc>,
}
