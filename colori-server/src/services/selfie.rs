//! Selfie upload decoding
//!
//! Clients send the selfie as a `data:` URL (what a browser `FileReader`
//! produces). The base64 payload is forwarded to the analyzer as-is after
//! checking that it decodes and fits the size limit.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelfieError {
    #[error("Invalid imageBase64 format. Expected a data URL.")]
    NotDataUrl,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image data is not valid base64")]
    InvalidBase64,

    #[error("Image is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },
}

/// A decoded-and-checked selfie ready to send to the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfieImage {
    pub mime_type: String,
    /// Base64 payload exactly as received
    pub base64_data: String,
    /// Decoded size in bytes
    pub byte_len: usize,
}

impl SelfieImage {
    /// Parse `data:<mime>;base64,<payload>`
    pub fn from_data_url(data_url: &str, max_bytes: usize) -> Result<Self, SelfieError> {
        let rest = data_url
            .trim()
            .strip_prefix("data:")
            .ok_or(SelfieError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(SelfieError::NotDataUrl)?;

        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(SelfieError::NotDataUrl);
        }
        if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(SelfieError::UnsupportedType(mime_type));
        }

        // Cheap upper bound before decoding anything
        let estimated = payload.len() / 4 * 3;
        if estimated > max_bytes + 3 {
            return Err(SelfieError::TooLarge {
                size: estimated,
                limit: max_bytes,
            });
        }

        let decoded = STANDARD
            .decode(payload.trim())
            .map_err(|_| SelfieError::InvalidBase64)?;
        if decoded.is_empty() {
            return Err(SelfieError::InvalidBase64);
        }
        if decoded.len() > max_bytes {
            return Err(SelfieError::TooLarge {
                size: decoded.len(),
                limit: max_bytes,
            });
        }

        Ok(Self {
            mime_type,
            base64_data: payload.trim().to_string(),
            byte_len: decoded.len(),
        })
    }
}
