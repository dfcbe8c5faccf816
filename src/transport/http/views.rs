//! Response views: records enriched with related data, with every stored
//! object reference normalized to the public `/files/...` proxy form on the
//! way out.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::model::{Chat, Donation, Message, Post, PostMedia, Rating, User, Verification};
use crate::domain::rating::status_for_points;
use crate::storage::object::keys::{public_path, public_path_opt};

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserInfo {
    pub fn from_user(user: &User) -> Self {
        UserInfo {
            id: user.id,
            name: user.display_name(),
            avatar: public_path_opt(&user.photo_url),
        }
    }
}

/// The caller's own profile; the photo reference is normalized, the password
/// hash never leaves the record.
#[derive(Serialize, Debug, ToSchema)]
pub struct ProfileView {
    pub id: i64,
    pub phone: String,
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

impl ProfileView {
    pub fn from_user(user: &User) -> Self {
        ProfileView {
            id: user.id,
            phone: user.phone.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            photo_url: public_path_opt(&user.photo_url),
            role: user.role.clone(),
            helper_name: user.helper_name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            is_active: user.is_active,
        }
    }
}

/// Verification status summary returned to the submitting user and reviewer.
#[derive(Serialize, Debug, ToSchema)]
pub struct VerificationView {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl VerificationView {
    pub fn from_record(v: &Verification) -> Self {
        VerificationView {
            id: v.id,
            user_id: v.user_id,
            status: v.status.clone(),
            submitted_at: v.submitted_at,
            reviewed_at: v.reviewed_at,
            reviewed_by: v.reviewed_by,
            rejection_reason: v.rejection_reason.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct PostMediaView {
    pub id: i64,
    pub post_id: i64,
    pub media_url: String,
    pub media_type: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl PostMediaView {
    pub fn from_record(m: &PostMedia) -> Self {
        PostMediaView {
            id: m.id,
            post_id: m.post_id,
            media_url: public_path(&m.media_url),
            media_type: m.media_type.clone(),
            order_index: m.order_index,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PostView {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<UserInfo>,
    pub media: Vec<PostMediaView>,
}

impl PostView {
    pub fn from_record(post: &Post, author: Option<&User>, media: &[PostMedia]) -> Self {
        PostView {
            id: post.id,
            user_id: post.user_id,
            title: post.title.clone(),
            description: post.description.clone(),
            amount: post.amount,
            collected: post.collected,
            recipient: post.recipient.clone(),
            bank: post.bank.clone(),
            phone: post.phone.clone(),
            status: post.status.clone(),
            created_at: post.created_at,
            updated_at: post.updated_at,
            is_editable: post.is_editable,
            author: author.map(UserInfo::from_user),
            media: media.iter().map(PostMediaView::from_record).collect(),
        }
    }
}

/// Compact post summary embedded in donation views.
#[derive(Serialize, Debug, ToSchema)]
pub struct PostInfo {
    pub id: i64,
    pub title: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[schema(value_type = f64)]
    pub collected: Decimal,
}

impl PostInfo {
    pub fn from_record(post: &Post) -> Self {
        PostInfo {
            id: post.id,
            title: post.title.clone(),
            amount: post.amount,
            collected: post.collected,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct DonationView {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostInfo>,
}

impl DonationView {
    pub fn from_record(d: &Donation, donor: Option<&User>, post: Option<&Post>) -> Self {
        DonationView {
            id: d.id,
            post_id: d.post_id,
            donor_id: d.donor_id,
            amount: d.amount,
            receipt_url: public_path_opt(&d.receipt_url),
            status: d.status.clone(),
            confirmed_at: d.confirmed_at,
            confirmed_by: d.confirmed_by,
            created_at: d.created_at,
            donor: donor.map(UserInfo::from_user),
            post: post.map(PostInfo::from_record),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct MessageView {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserInfo>,
}

impl MessageView {
    pub fn from_record(m: &Message, sender: Option<&User>) -> Self {
        MessageView {
            id: m.id,
            chat_id: m.chat_id,
            sender_id: m.sender_id,
            text: m.text.clone(),
            attachment_url: public_path_opt(&m.attachment_url).filter(|u| !u.is_empty()),
            is_read: m.is_read,
            is_edited: m.is_edited,
            created_at: m.created_at,
            updated_at: m.updated_at,
            sender: sender.map(UserInfo::from_user),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ChatView {
    pub id: i64,
    pub post_id: i64,
    pub helper_id: i64,
    pub needy_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interlocutor: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessageView>,
    pub unread_count: i64,
}

impl ChatView {
    pub fn from_record(
        chat: &Chat,
        post: Option<PostView>,
        interlocutor: Option<&User>,
        last_message: Option<MessageView>,
        unread_count: i64,
    ) -> Self {
        ChatView {
            id: chat.id,
            post_id: chat.post_id,
            helper_id: chat.helper_id,
            needy_id: chat.needy_id,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
            post,
            interlocutor: interlocutor.map(UserInfo::from_user),
            last_message,
            unread_count,
        }
    }
}

/// Rating with the derived tier label and leaderboard position.
#[derive(Serialize, Debug, ToSchema)]
pub struct RatingView {
    pub id: i64,
    pub user_id: i64,
    pub points: i64,
    #[schema(value_type = f64)]
    pub total_donated: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub status: Option<&'static str>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    pub position: i64,
}

impl RatingView {
    pub fn from_record(rating: &Rating, user: Option<&User>, position: i64) -> Self {
        RatingView {
            id: rating.id,
            user_id: rating.user_id,
            points: rating.points,
            total_donated: rating.total_donated,
            status: status_for_points(rating.points),
            updated_at: rating.updated_at,
            user: user.map(UserInfo::from_user),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Rating;
    use chrono::Utc;

    fn rating(points: i64) -> Rating {
        Rating {
            id: 1,
            user_id: 1,
            points,
            total_donated: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn rating_view_derives_the_tier_label() {
        assert_eq!(RatingView::from_record(&rating(0), None, 1).status, None);
        assert_eq!(
            RatingView::from_record(&rating(5), None, 1).status,
            Some("Platform Friend")
        );
        assert_eq!(
            RatingView::from_record(&rating(6000), None, 1).status,
            Some("Blazing Heart")
        );
    }
}
