//! Bucket names, deterministic object keys and public URL normalization.

use crate::infra::config::StorageConfig;

pub const BUCKET_USER_PHOTOS: &str = "user-photos";
pub const BUCKET_VERIFICATION_DOCS: &str = "verification-docs";
pub const BUCKET_POST_MEDIA: &str = "post-media";
pub const BUCKET_DONATION_RECEIPTS: &str = "donation-receipts";
pub const BUCKET_CHAT_ATTACHMENTS: &str = "chat-attachments";

pub const ALL_BUCKETS: &[&str] = &[
    BUCKET_USER_PHOTOS,
    BUCKET_VERIFICATION_DOCS,
    BUCKET_POST_MEDIA,
    BUCKET_DONATION_RECEIPTS,
    BUCKET_CHAT_ATTACHMENTS,
];

/// File extension for a declared content type; generic binary otherwise.
pub fn extension_for(content_type: &str) -> &'static str {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("jpeg") || ct.contains("jpg") {
        ".jpg"
    } else if ct.contains("png") {
        ".png"
    } else if ct.contains("webp") {
        ".webp"
    } else if ct.contains("mp4") {
        ".mp4"
    } else if ct.contains("webm") {
        ".webm"
    } else if ct.contains("pdf") {
        ".pdf"
    } else {
        ".bin"
    }
}

pub fn user_photo_key(user_id: i64, content_type: &str) -> String {
    format!("users/{}/photo{}", user_id, extension_for(content_type))
}

pub fn verification_doc_key(verification_id: i64, name: &str, content_type: &str) -> String {
    format!(
        "verifications/{}/{}{}",
        verification_id,
        name,
        extension_for(content_type)
    )
}

pub fn post_media_key(post_id: i64, index: i32, content_type: &str) -> String {
    format!("posts/{}/media_{}{}", post_id, index, extension_for(content_type))
}

pub fn donation_receipt_key(donation_id: i64, content_type: &str) -> String {
    format!("donations/{}/receipt{}", donation_id, extension_for(content_type))
}

pub fn chat_attachment_key(chat_id: i64, message_id: i64, content_type: &str) -> String {
    format!(
        "chats/{}/messages/{}/attachment{}",
        chat_id,
        message_id,
        extension_for(content_type)
    )
}

/// Endpoint-form URL stored in the database. The port is stripped so stored
/// references survive endpoint changes; clients never see this form directly.
pub fn object_url(cfg: &StorageConfig, bucket: &str, key: &str) -> String {
    let scheme = if cfg.use_ssl { "https" } else { "http" };
    let host = cfg.endpoint.split(':').next().unwrap_or(&cfg.endpoint);
    format!("{}://{}/{}/{}", scheme, host, bucket, key)
}

/// Normalizes any stored reference into the public proxy form
/// `/files/{bucket}/{objectKey}`, independent of the storage endpoint's
/// scheme, host or port. References already in proxy form pass through;
/// unparseable values are returned unchanged.
pub fn public_path(url: &str) -> String {
    if url.is_empty() || url.starts_with("/files/") {
        return url.to_string();
    }
    let rest = match url.split_once("://") {
        Some((_scheme, rest)) => rest,
        None => return url.to_string(),
    };
    match rest.split_once('/') {
        Some((_host, bucket_and_key)) if !bucket_and_key.is_empty() => {
            format!("/files/{}", bucket_and_key)
        }
        _ => url.to_string(),
    }
}

/// `public_path` applied through an `Option`, for records with optional refs.
pub fn public_path_opt(url: &Option<String>) -> Option<String> {
    url.as_ref().map(|u| public_path(u))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(endpoint: &str, use_ssl: bool) -> StorageConfig {
        StorageConfig {
            endpoint: endpoint.to_string(),
            access_key_id: "ak".into(),
            secret_access_key: "sk".into(),
            use_ssl,
            region: "us-east-1".into(),
        }
    }

    #[test]
    fn extensions_follow_content_type() {
        assert_eq!(extension_for("image/jpeg"), ".jpg");
        assert_eq!(extension_for("image/png"), ".png");
        assert_eq!(extension_for("video/mp4"), ".mp4");
        assert_eq!(extension_for("application/pdf"), ".pdf");
        assert_eq!(extension_for("application/octet-stream"), ".bin");
    }

    #[test]
    fn keys_are_entity_scoped() {
        assert_eq!(user_photo_key(7, "image/png"), "users/7/photo.png");
        assert_eq!(post_media_key(3, 2, "video/webm"), "posts/3/media_2.webm");
        assert_eq!(donation_receipt_key(11, "application/pdf"), "donations/11/receipt.pdf");
        assert_eq!(
            chat_attachment_key(4, 9, "image/jpeg"),
            "chats/4/messages/9/attachment.jpg"
        );
    }

    #[test]
    fn stored_url_strips_the_port() {
        let url = object_url(&cfg("minio:9000", false), "user-photos", "users/1/photo.jpg");
        assert_eq!(url, "http://minio/user-photos/users/1/photo.jpg");
    }

    #[test]
    fn normalization_is_endpoint_independent() {
        for stored in [
            "http://localhost/user-photos/users/1/photo.jpg",
            "http://localhost:9000/user-photos/users/1/photo.jpg",
            "https://minio:9000/user-photos/users/1/photo.jpg",
            "https://storage.example.com/user-photos/users/1/photo.jpg",
        ] {
            assert_eq!(public_path(stored), "/files/user-photos/users/1/photo.jpg");
        }
    }

    #[test]
    fn normalization_passes_through_proxy_form_and_garbage() {
        assert_eq!(public_path("/files/post-media/posts/1/media_0.jpg"), "/files/post-media/posts/1/media_0.jpg");
        assert_eq!(public_path("not a url"), "not a url");
        assert_eq!(public_path(""), "");
    }

    #[test]
    fn round_trip_store_then_normalize() {
        let cfg = cfg("minio:9000", false);
        let stored = object_url(&cfg, BUCKET_POST_MEDIA, "posts/5/media_0.jpg");
        assert_eq!(public_path(&stored), "/files/post-media/posts/5/media_0.jpg");
    }
}
