use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

use crate::config::CONFIG;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported upload format '{0}'; please upload a photo (PNG, JPEG, WebP or HEIC).")]
    UnsupportedFormat(String),
    #[error("Upload of {size} bytes exceeds the {limit} byte limit.")]
    TooLarge { size: usize, limit: usize },
    #[error("The uploaded file could not be decoded as an image: {0}")]
    InvalidImage(String),
}

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

fn normalize_photo_mime(mime_type: &str) -> String {
    let lowered = mime_type.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        _ => lowered,
    }
}

fn is_supported_photo_mime(mime_type: &str) -> bool {
    matches!(
        mime_type,
        "image/png" | "image/jpeg" | "image/webp" | "image/heic" | "image/heif"
    )
}

/// A self-describing encoded image: format tag plus binary payload. Opaque to
/// everything except the upload gate and the provider adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: normalize_photo_mime(&mime_type.into()),
            bytes,
        }
    }

    /// Gate for user uploads: sniffs the format, rejects anything that is not
    /// a photo, and confirms decodable formats actually decode.
    pub fn from_upload(bytes: Vec<u8>) -> Result<Self, UploadError> {
        let limit = CONFIG.max_upload_bytes;
        if bytes.len() > limit {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                limit,
            });
        }

        let mime_type = detect_mime_type(&bytes)
            .map(|mime| normalize_photo_mime(&mime))
            .ok_or_else(|| UploadError::UnsupportedFormat("unknown".to_string()))?;
        if !is_supported_photo_mime(&mime_type) {
            return Err(UploadError::UnsupportedFormat(mime_type));
        }

        // HEIC/HEIF are accepted on the sniff alone; the decoder stack only
        // covers png/jpeg/webp.
        if mime_type != "image/heic" && mime_type != "image/heif" {
            image::load_from_memory(&bytes)
                .map_err(|err| UploadError::InvalidImage(err.to_string()))?;
        }

        Ok(Self { mime_type, bytes })
    }

    pub fn base64_data(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data())
    }

    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (mime_type, payload) = rest.split_once(";base64,")?;
        let bytes = general_purpose::STANDARD.decode(payload).ok()?;
        if mime_type.trim().is_empty() {
            return None;
        }
        Some(Self::new(mime_type, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
