//! The domain lifecycle engine.
//!
//! This service owns every entity state machine and cross-entity cascade:
//! verification review gates post creation, donation confirmation cascades
//! into the post's collected amount and the donor's rating, and chat/message
//! operations are bound to their participants. Handlers never mutate state
//! except through this engine.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::error::AppError;
use crate::domain::model::{
    donation_status, verification_status, Chat, Donation, Message, Post, PostMedia, Principal,
    Rating, Verification,
};
use crate::domain::rating;
use crate::storage::repo::{chats, donations, messages, posts, ratings, verifications};

#[derive(Clone)]
pub struct LifecycleEngine {
    pool: PgPool,
}

impl LifecycleEngine {
    pub fn new(pool: PgPool) -> Self {
        LifecycleEngine { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ----- verification -----

    /// Submits a verification request. Submission is one-shot: a user with an
    /// existing verification in any status may not submit another.
    pub async fn submit_verification(
        &self,
        actor: &Principal,
        mut request: verifications::NewVerification,
    ) -> Result<Verification, AppError> {
        request.user_id = actor.id;
        if verifications::exists_for_user(&self.pool, actor.id).await? {
            return Err(AppError::conflict(
                "a verification request has already been submitted",
            ));
        }
        verifications::create(&self.pool, &request).await
    }

    pub async fn my_verification(&self, actor: &Principal) -> Result<Verification, AppError> {
        verifications::get_by_user(&self.pool, actor.id).await
    }

    /// Admin review: `pending -> approved | rejected`, stamping the reviewer.
    /// Reviewing a non-pending verification is a conflict.
    pub async fn review_verification(
        &self,
        actor: &Principal,
        verification_id: i64,
        decision: &str,
        rejection_reason: Option<&str>,
    ) -> Result<Verification, AppError> {
        if !actor.is_admin() {
            return Err(AppError::forbidden("admin role required"));
        }
        if decision != verification_status::APPROVED && decision != verification_status::REJECTED {
            return Err(AppError::validation(
                "status must be 'approved' or 'rejected'",
            ));
        }
        // Existence first, so an absent id reports NotFound rather than
        // Conflict.
        let existing = verifications::get(&self.pool, verification_id).await?;
        let moved = verifications::review(
            &self.pool,
            verification_id,
            decision,
            actor.id,
            rejection_reason,
        )
        .await?;
        if moved == 0 {
            return Err(AppError::conflict(format!(
                "verification is already {}",
                existing.status
            )));
        }
        verifications::get(&self.pool, verification_id).await
    }

    // ----- posts -----

    /// Creates a fundraising post. Only users whose verification has been
    /// approved may publish.
    pub async fn create_post(
        &self,
        actor: &Principal,
        mut post: posts::NewPost,
    ) -> Result<Post, AppError> {
        if post.amount <= Decimal::ZERO {
            return Err(AppError::validation("amount must be positive"));
        }
        if !verifications::is_user_approved(&self.pool, actor.id).await? {
            return Err(AppError::forbidden("user is not verified"));
        }
        post.user_id = actor.id;
        posts::create(&self.pool, &post).await
    }

    /// Loads a post and checks that the actor owns it.
    pub async fn owned_post(&self, actor: &Principal, post_id: i64) -> Result<Post, AppError> {
        let post = posts::get(&self.pool, post_id).await?;
        if post.user_id != actor.id {
            return Err(AppError::forbidden("only the author may modify this post"));
        }
        Ok(post)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_post(
        &self,
        actor: &Principal,
        post_id: i64,
        title: Option<&str>,
        description: Option<&str>,
        amount: Option<Decimal>,
        recipient: Option<&str>,
        bank: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Post, AppError> {
        self.owned_post(actor, post_id).await?;
        if let Some(amount) = amount {
            if amount <= Decimal::ZERO {
                return Err(AppError::validation("amount must be positive"));
            }
        }
        posts::update(
            &self.pool, post_id, title, description, amount, recipient, bank, phone,
        )
        .await
    }

    pub async fn delete_post(&self, actor: &Principal, post_id: i64) -> Result<(), AppError> {
        self.owned_post(actor, post_id).await?;
        posts::delete(&self.pool, post_id).await
    }

    /// Attaches uploaded media to a post, appending at the next order index.
    pub async fn attach_post_media(
        &self,
        actor: &Principal,
        post_id: i64,
        media_url: &str,
        media_type: &str,
    ) -> Result<PostMedia, AppError> {
        self.owned_post(actor, post_id).await?;
        let index = posts::next_media_index(&self.pool, post_id).await?;
        posts::create_media(&self.pool, post_id, media_url, media_type, index).await
    }

    pub async fn remove_post_media(
        &self,
        actor: &Principal,
        post_id: i64,
        media_id: i64,
    ) -> Result<PostMedia, AppError> {
        self.owned_post(actor, post_id).await?;
        let media = posts::get_media(&self.pool, post_id, media_id).await?;
        posts::delete_media(&self.pool, post_id, media_id).await?;
        Ok(media)
    }

    // ----- donations -----

    /// Creates a pending donation against an existing post.
    pub async fn create_donation(
        &self,
        actor: &Principal,
        post_id: i64,
        amount: Decimal,
    ) -> Result<Donation, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("amount must be positive"));
        }
        posts::get(&self.pool, post_id).await?;
        donations::create(&self.pool, post_id, actor.id, amount).await
    }

    /// Loads a donation and checks that the actor may attach a receipt to it
    /// (the donor, or an admin). Used before accepting the upload itself.
    pub async fn receipt_target(
        &self,
        actor: &Principal,
        donation_id: i64,
    ) -> Result<Donation, AppError> {
        let donation = donations::get(&self.pool, donation_id).await?;
        if donation.donor_id != actor.id && !actor.is_admin() {
            return Err(AppError::forbidden("only the donor may attach a receipt"));
        }
        Ok(donation)
    }

    /// Attaches a payment receipt reference; only the donor may do this.
    pub async fn attach_receipt(
        &self,
        actor: &Principal,
        donation_id: i64,
        receipt_url: &str,
    ) -> Result<Donation, AppError> {
        let donation = donations::get(&self.pool, donation_id).await?;
        if donation.donor_id != actor.id && !actor.is_admin() {
            return Err(AppError::forbidden("only the donor may attach a receipt"));
        }
        donations::set_receipt_url(&self.pool, donation_id, receipt_url).await?;
        donations::get(&self.pool, donation_id).await
    }

    /// Resolves a pending donation. Confirmation runs the full cascade in one
    /// transaction: flip the status (conditionally, guarding against
    /// re-transition and concurrent confirms), add the amount to the post's
    /// collected total, and credit the donor's rating. Rejection only stamps
    /// status, time and actor.
    pub async fn resolve_donation(
        &self,
        actor: &Principal,
        donation_id: i64,
        decision: &str,
    ) -> Result<Donation, AppError> {
        if decision != donation_status::CONFIRMED && decision != donation_status::REJECTED {
            return Err(AppError::validation(
                "status must be 'confirmed' or 'rejected'",
            ));
        }
        let donation = donations::get(&self.pool, donation_id).await?;
        let post = posts::get(&self.pool, donation.post_id).await?;
        if !actor.is_admin() && post.user_id != actor.id {
            return Err(AppError::forbidden(
                "only the post author or an admin may resolve a donation",
            ));
        }

        let mut tx = self.pool.begin().await?;
        let flipped = sqlx::query(
            "UPDATE donations \
             SET status = $2, confirmed_at = now(), confirmed_by = $3 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(donation_id)
        .bind(decision)
        .bind(actor.id)
        .execute(&mut *tx)
        .await?;
        if flipped.rows_affected() == 0 {
            return Err(AppError::conflict("donation is not pending"));
        }

        if decision == donation_status::CONFIRMED {
            sqlx::query(
                "UPDATE posts SET collected = collected + $2, updated_at = now() WHERE id = $1",
            )
            .bind(donation.post_id)
            .bind(donation.amount)
            .execute(&mut *tx)
            .await?;

            let points = rating::points_for_amount(donation.amount);
            sqlx::query(
                "INSERT INTO ratings (user_id, points, total_donated) VALUES ($1, $2, $3) \
                 ON CONFLICT (user_id) DO UPDATE SET \
                    points = ratings.points + EXCLUDED.points, \
                    total_donated = ratings.total_donated + EXCLUDED.total_donated, \
                    updated_at = now()",
            )
            .bind(donation.donor_id)
            .bind(points)
            .bind(donation.amount)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        donations::get(&self.pool, donation_id).await
    }

    // ----- chats -----

    /// Opens a chat between the actor (helper) and the post's owner. One chat
    /// per (post, helper) pair; the owner cannot open a chat on their own
    /// post.
    pub async fn open_chat(&self, actor: &Principal, post_id: i64) -> Result<Chat, AppError> {
        let post = posts::get(&self.pool, post_id).await?;
        if post.user_id == actor.id {
            return Err(AppError::Unprocessable(
                "cannot open a chat on your own post".to_string(),
            ));
        }
        chats::create(&self.pool, post_id, actor.id, post.user_id).await
    }

    /// Loads a chat and checks that the actor participates in it.
    pub async fn member_chat(&self, actor: &Principal, chat_id: i64) -> Result<Chat, AppError> {
        let chat = chats::get(&self.pool, chat_id).await?;
        if chat.helper_id != actor.id && chat.needy_id != actor.id {
            return Err(AppError::forbidden("not a participant of this chat"));
        }
        Ok(chat)
    }

    /// Sends a message; at least one of text / attachment must be present.
    /// The attachment reference is filled in by the caller after upload via
    /// `set_message_attachment`.
    pub async fn send_message(
        &self,
        actor: &Principal,
        chat_id: i64,
        text: Option<&str>,
        has_attachment: bool,
    ) -> Result<Message, AppError> {
        self.member_chat(actor, chat_id).await?;
        let text = text.filter(|t| !t.is_empty());
        if text.is_none() && !has_attachment {
            return Err(AppError::validation("text or attachment is required"));
        }
        // Empty placeholder satisfies the presence constraint until the
        // upload lands and the real reference replaces it.
        let placeholder = if has_attachment { Some("") } else { None };
        let message = messages::create(&self.pool, chat_id, actor.id, text, placeholder).await?;
        chats::touch(&self.pool, chat_id).await?;
        Ok(message)
    }

    pub async fn set_message_attachment(
        &self,
        chat_id: i64,
        message_id: i64,
        attachment_url: &str,
    ) -> Result<Message, AppError> {
        messages::set_attachment_url(&self.pool, message_id, attachment_url).await?;
        messages::get(&self.pool, chat_id, message_id).await
    }

    /// Edits a message's text; only the sender may edit.
    pub async fn edit_message(
        &self,
        actor: &Principal,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<Message, AppError> {
        self.member_chat(actor, chat_id).await?;
        let message = messages::get(&self.pool, chat_id, message_id).await?;
        if message.sender_id != actor.id {
            return Err(AppError::forbidden("only the sender may edit a message"));
        }
        messages::update_text(&self.pool, message_id, text).await
    }

    /// Deletes a message; only the sender may delete.
    pub async fn delete_message(
        &self,
        actor: &Principal,
        chat_id: i64,
        message_id: i64,
    ) -> Result<(), AppError> {
        self.member_chat(actor, chat_id).await?;
        let message = messages::get(&self.pool, chat_id, message_id).await?;
        if message.sender_id != actor.id {
            return Err(AppError::forbidden("only the sender may delete a message"));
        }
        messages::delete(&self.pool, message_id).await
    }

    /// Marks messages in a chat as read for the actor.
    pub async fn mark_messages_read(
        &self,
        actor: &Principal,
        chat_id: i64,
        message_ids: &[i64],
    ) -> Result<u64, AppError> {
        self.member_chat(actor, chat_id).await?;
        messages::mark_read(&self.pool, chat_id, actor.id, message_ids).await
    }

    // ----- ratings -----

    /// The actor's rating (created lazily) together with the leaderboard
    /// position.
    pub async fn my_rating(&self, actor: &Principal) -> Result<(Rating, i64), AppError> {
        let rating = ratings::get_or_create(&self.pool, actor.id).await?;
        let position = ratings::position(&self.pool, actor.id).await?;
        Ok((rating, position))
    }
}
