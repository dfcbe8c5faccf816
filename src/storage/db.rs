//! Connection pool construction and startup schema creation.
//!
//! The schema is applied with idempotent `CREATE TABLE IF NOT EXISTS`
//! statements executed once at startup.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn init_schema(pool: &PgPool) -> anyhow::Result<()> {
    let statements: &[&str] = &[
        "CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            phone VARCHAR(20) UNIQUE NOT NULL,
            password_hash VARCHAR(255) NOT NULL,
            first_name VARCHAR(100) NOT NULL,
            last_name VARCHAR(100) NOT NULL,
            photo_url VARCHAR(500),
            role VARCHAR(20) NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'helper', 'needy', 'admin')),
            helper_name VARCHAR(100),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            is_active BOOLEAN NOT NULL DEFAULT true
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_phone ON users(phone)",
        "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
        "CREATE TABLE IF NOT EXISTS verifications (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT UNIQUE NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            user_photo_url VARCHAR(500),
            last_name VARCHAR(100) NOT NULL,
            first_name VARCHAR(100) NOT NULL,
            middle_name VARCHAR(100),
            birth_date DATE NOT NULL,
            passport_series VARCHAR(10) NOT NULL,
            passport_number VARCHAR(20) NOT NULL,
            passport_issuer VARCHAR(500) NOT NULL,
            passport_date DATE NOT NULL,
            doc_type VARCHAR(10) NOT NULL CHECK (doc_type IN ('inn', 'snils')),
            inn VARCHAR(20),
            snils VARCHAR(20),
            passport_scans_urls TEXT[] NOT NULL DEFAULT '{}',
            consent1 BOOLEAN NOT NULL DEFAULT false,
            consent2 BOOLEAN NOT NULL DEFAULT false,
            consent3 BOOLEAN NOT NULL DEFAULT false,
            status VARCHAR(20) NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'rejected')),
            submitted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            reviewed_at TIMESTAMPTZ,
            reviewed_by BIGINT REFERENCES users(id),
            rejection_reason TEXT
        )",
        "CREATE INDEX IF NOT EXISTS idx_verifications_status ON verifications(status)",
        "CREATE TABLE IF NOT EXISTS posts (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title VARCHAR(500) NOT NULL,
            description TEXT NOT NULL,
            amount NUMERIC(15,2) NOT NULL CHECK (amount > 0),
            collected NUMERIC(15,2) NOT NULL DEFAULT 0 CHECK (collected >= 0),
            recipient VARCHAR(200) NOT NULL,
            bank VARCHAR(100) NOT NULL,
            phone VARCHAR(20) NOT NULL,
            status VARCHAR(20) NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'completed', 'closed', 'moderated')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            is_editable BOOLEAN NOT NULL DEFAULT true
        )",
        "CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status)",
        "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC)",
        "CREATE TABLE IF NOT EXISTS post_media (
            id BIGSERIAL PRIMARY KEY,
            post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            media_url VARCHAR(500) NOT NULL,
            media_type VARCHAR(20) NOT NULL CHECK (media_type IN ('image', 'video')),
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
        "CREATE INDEX IF NOT EXISTS idx_post_media_order ON post_media(post_id, order_index)",
        "CREATE TABLE IF NOT EXISTS donations (
            id BIGSERIAL PRIMARY KEY,
            post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            donor_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            amount NUMERIC(15,2) NOT NULL CHECK (amount > 0),
            receipt_url VARCHAR(500),
            status VARCHAR(20) NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'confirmed', 'rejected')),
            confirmed_at TIMESTAMPTZ,
            confirmed_by BIGINT REFERENCES users(id),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
        "CREATE INDEX IF NOT EXISTS idx_donations_post_id ON donations(post_id)",
        "CREATE INDEX IF NOT EXISTS idx_donations_donor_id ON donations(donor_id)",
        "CREATE INDEX IF NOT EXISTS idx_donations_status ON donations(status)",
        "CREATE TABLE IF NOT EXISTS chats (
            id BIGSERIAL PRIMARY KEY,
            post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            helper_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            needy_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            UNIQUE(post_id, helper_id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_chats_helper_id ON chats(helper_id)",
        "CREATE INDEX IF NOT EXISTS idx_chats_needy_id ON chats(needy_id)",
        "CREATE TABLE IF NOT EXISTS messages (
            id BIGSERIAL PRIMARY KEY,
            chat_id BIGINT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
            sender_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            text TEXT,
            attachment_url VARCHAR(500),
            is_read BOOLEAN NOT NULL DEFAULT false,
            is_edited BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            CHECK (text IS NOT NULL OR attachment_url IS NOT NULL)
        )",
        "CREATE INDEX IF NOT EXISTS idx_messages_chat_created ON messages(chat_id, created_at DESC)",
        "CREATE TABLE IF NOT EXISTS ratings (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT UNIQUE NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            points BIGINT NOT NULL DEFAULT 0 CHECK (points >= 0),
            total_donated NUMERIC(15,2) NOT NULL DEFAULT 0 CHECK (total_donated >= 0),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
        "CREATE INDEX IF NOT EXISTS idx_ratings_points ON ratings(points DESC)",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
