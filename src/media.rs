//! Guard for MMS media attachments. Independent of admission.

use serde::Serialize;
use url::Url;

/// File extensions accepted for media attachments.
pub const ALLOWED_EXTENSIONS: [&str; 7] = [".jpg", ".jpeg", ".png", ".gif", ".mp4", ".mov", ".pdf"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MediaValidation {
    fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn fail(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

/// Accept only `https` URLs whose path ends in an allowed extension.
pub fn validate_media_url(raw: &str) -> MediaValidation {
    let url = match Url::parse(raw.trim()) {
        Ok(url) => url,
        Err(e) => return MediaValidation::fail(format!("invalid media URL: {}", e)),
    };

    if url.scheme() != "https" {
        return MediaValidation::fail(format!(
            "media URL must use https, got {}",
            url.scheme()
        ));
    }

    let path = url.path().to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return MediaValidation::fail(format!(
            "media type not allowed; expected one of {}",
            ALLOWED_EXTENSIONS.join(" ")
        ));
    }

    MediaValidation::ok()
}
