//! Structural validation of request payloads and uploaded files.
//!
//! DTO validation uses `validator` derive rules; failures are folded into the
//! structured validation error envelope. File checks mirror the platform's
//! upload policy: per-purpose size caps and extension allowlists.

use serde_json::json;
use validator::Validate;

use crate::domain::error::AppError;

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_MEDIA_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_RECEIPT_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const VIDEO_EXTS: &[&str] = &["mp4", "webm"];
const DOCUMENT_EXTS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// Runs derive-based validation and converts failures into the error envelope
/// with a per-field details object.
pub fn validate<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|errors| {
        let mut details = serde_json::Map::new();
        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            details.insert(field.to_string(), json!(messages));
        }
        AppError::validation_with("validation failed", json!(details))
    })
}

/// Enforces a size cap on an uploaded file.
pub fn ensure_size(len: usize, max: usize, label: &'static str) -> Result<(), AppError> {
    if len > max {
        return Err(AppError::FileTooLarge(label));
    }
    Ok(())
}

/// The file must be an image (by filename extension, falling back to the
/// declared content type).
pub fn ensure_image(filename: Option<&str>, content_type: Option<&str>) -> Result<(), AppError> {
    if matches_exts(filename, content_type, IMAGE_EXTS) {
        return Ok(());
    }
    Err(AppError::UnsupportedMediaType(
        "allowed image formats: JPEG, PNG, WebP".to_string(),
    ))
}

/// The file must be an image or a video; returns which one.
pub fn ensure_media(
    filename: Option<&str>,
    content_type: Option<&str>,
) -> Result<&'static str, AppError> {
    if matches_exts(filename, content_type, IMAGE_EXTS) {
        return Ok(crate::domain::model::media_type::IMAGE);
    }
    if matches_exts(filename, content_type, VIDEO_EXTS) {
        return Ok(crate::domain::model::media_type::VIDEO);
    }
    Err(AppError::UnsupportedMediaType(
        "allowed media formats: JPEG, PNG, WebP, MP4, WebM".to_string(),
    ))
}

/// The file must be a document (PDF or image).
pub fn ensure_document(filename: Option<&str>, content_type: Option<&str>) -> Result<(), AppError> {
    if matches_exts(filename, content_type, DOCUMENT_EXTS) {
        return Ok(());
    }
    Err(AppError::UnsupportedMediaType(
        "allowed document formats: PDF, JPEG, PNG".to_string(),
    ))
}

fn matches_exts(filename: Option<&str>, content_type: Option<&str>, allowed: &[&str]) -> bool {
    if let Some(ext) = filename.and_then(extension_of) {
        return allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext));
    }
    if let Some(ct) = content_type {
        let ct = ct.to_ascii_lowercase();
        return allowed.iter().any(|a| ct.contains(a));
    }
    false
}

fn extension_of(filename: &str) -> Option<String> {
    let ext = filename.rsplit('.').next()?;
    if ext.len() == filename.len() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Strips spaces, dashes and parentheses from a phone number.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect()
}

/// Basic phone sanity check after normalization.
pub fn ensure_phone(phone: &str) -> Result<(), AppError> {
    let normalized = normalize_phone(phone);
    if normalized.len() < 10 || normalized.len() > 20 {
        return Err(AppError::validation_with(
            "invalid phone number",
            json!({"field": "phone"}),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_check_accepts_extension_or_content_type() {
        assert!(ensure_image(Some("photo.JPG"), None).is_ok());
        assert!(ensure_image(Some("photo.webp"), None).is_ok());
        assert!(ensure_image(None, Some("image/png")).is_ok());
        assert!(ensure_image(Some("doc.pdf"), None).is_err());
        assert!(ensure_image(None, None).is_err());
    }

    #[test]
    fn media_check_distinguishes_images_from_videos() {
        assert_eq!(ensure_media(Some("clip.mp4"), None).unwrap(), "video");
        assert_eq!(ensure_media(Some("pic.png"), None).unwrap(), "image");
        assert!(ensure_media(Some("notes.txt"), None).is_err());
    }

    #[test]
    fn document_check_accepts_pdf_and_images() {
        assert!(ensure_document(Some("receipt.pdf"), None).is_ok());
        assert!(ensure_document(Some("receipt.jpeg"), None).is_ok());
        assert!(ensure_document(Some("receipt.mp4"), None).is_err());
    }

    #[test]
    fn size_cap_is_inclusive() {
        assert!(ensure_size(MAX_PHOTO_BYTES, MAX_PHOTO_BYTES, "5MB").is_ok());
        assert!(ensure_size(MAX_PHOTO_BYTES + 1, MAX_PHOTO_BYTES, "5MB").is_err());
    }

    #[test]
    fn phone_normalization_strips_formatting() {
        assert_eq!(normalize_phone("+7 (912) 345-67-89"), "+79123456789");
        assert!(ensure_phone("+7 (912) 345-67-89").is_ok());
        assert!(ensure_phone("123").is_err());
    }

    #[test]
    fn filename_without_extension_falls_back_to_content_type() {
        assert!(ensure_image(Some("photo"), Some("image/jpeg")).is_ok());
        assert!(ensure_image(Some("photo"), Some("text/plain")).is_err());
    }
}
