/// Shared data structures for the application state
///
/// These structs represent the data model that flows from the acquirer,
/// through the identification call, to the result view.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::AcquireError;

/// Image types accepted for identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageMime {
    Jpeg,
    Png,
    Heic,
    Webp,
}

impl ImageMime {
    /// File extensions offered by the file picker
    pub const EXTENSIONS: [&'static str; 6] = ["jpg", "jpeg", "png", "heic", "heif", "webp"];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
            ImageMime::Heic => "image/heic",
            ImageMime::Webp => "image/webp",
        }
    }

    /// Whether the on-screen preview can decode this type (no HEIC decoder)
    pub fn can_preview(self) -> bool {
        !matches!(self, ImageMime::Heic)
    }

    /// Map a MIME string onto the allow-list
    ///
    /// `image/heif` is what content sniffing reports for HEIC files.
    pub fn from_mime_str(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageMime::Jpeg),
            "image/png" => Some(ImageMime::Png),
            "image/heic" | "image/heif" => Some(ImageMime::Heic),
            "image/webp" => Some(ImageMime::Webp),
            _ => None,
        }
    }

    /// Guess the type from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageMime::Jpeg),
            "png" => Some(ImageMime::Png),
            "heic" | "heif" => Some(ImageMime::Heic),
            "webp" => Some(ImageMime::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A self-contained image: `data:<mime>;base64,<payload>`
///
/// Never mutated; a new acquisition produces a new value.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime: ImageMime,
    data_uri: String,
}

impl EncodedImage {
    /// Encode raw image bytes of a known type
    pub fn from_bytes(mime: ImageMime, bytes: &[u8]) -> Self {
        let data_uri = format!("data:{};base64,{}", mime.as_str(), STANDARD.encode(bytes));
        Self { mime, data_uri }
    }

    /// Parse an existing data URI, enforcing the MIME allow-list
    pub fn parse(data_uri: &str) -> Result<Self, AcquireError> {
        let rest = data_uri
            .strip_prefix("data:")
            .ok_or_else(|| AcquireError::UnsupportedType("not a data URI".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AcquireError::UnsupportedType("data URI has no payload".to_string()))?;
        let mime_str = header
            .strip_suffix(";base64")
            .ok_or_else(|| AcquireError::UnsupportedType(format!("{header} is not base64")))?;
        let mime = ImageMime::from_mime_str(mime_str)
            .ok_or_else(|| AcquireError::UnsupportedType(mime_str.to_string()))?;

        STANDARD
            .decode(payload)
            .map_err(|e| AcquireError::Read(format!("invalid base64 payload: {e}")))?;

        Ok(Self {
            mime,
            data_uri: format!("data:{};base64,{}", mime.as_str(), payload),
        })
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn as_data_uri(&self) -> &str {
        &self.data_uri
    }

    /// The base64 part after the comma
    pub fn payload(&self) -> &str {
        self.data_uri
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }

    /// Decode back to the raw image bytes (for the on-screen preview)
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.payload())
    }
}

// Data URIs are megabytes long; keep Debug output readable
impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime", &self.mime)
            .field("len", &self.data_uri.len())
            .finish()
    }
}

/// One identification call: the image plus the session ticket that issued it
#[derive(Debug, Clone)]
pub struct IdentificationRequest {
    pub ticket: u64,
    pub image: EncodedImage,
}

/// Wire shape of a request: `{"photoDataUri": "..."}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyInput<'a> {
    pub photo_data_uri: &'a str,
}

impl IdentificationRequest {
    pub fn input(&self) -> IdentifyInput<'_> {
        IdentifyInput {
            photo_data_uri: self.image.as_data_uri(),
        }
    }
}

/// Structured species metadata returned by the identification call
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationResult {
    /// Common name (e.g., "Red Fox")
    pub species_name: String,
    /// Binomial name (e.g., "Vulpes vulpes")
    pub scientific_name: String,
    pub species_classification: String,
    pub habitat: String,
    pub diet: String,
    pub conservation_status: String,
    pub interesting_facts: String,
    /// Confidence on a 0-100 scale
    pub confidence: f64,
    /// Absent when venom does not apply (plants, fungi, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venomous: Option<bool>,
}

impl IdentificationResult {
    /// Parse a JSON body and reject values outside the contract
    pub fn from_json(json: &str) -> Result<Self, crate::error::IdentifyError> {
        let result: Self = serde_json::from_str(json)
            .map_err(|e| crate::error::IdentifyError::Parse(e.to_string()))?;
        result.validate()?;
        Ok(result)
    }

    /// Confidence must be a finite number in 0..=100
    pub fn validate(&self) -> Result<(), crate::error::IdentifyError> {
        if !self.confidence.is_finite() || !(0.0..=100.0).contains(&self.confidence) {
            return Err(crate::error::IdentifyError::Malformed(format!(
                "confidence {} outside 0-100",
                self.confidence
            )));
        }
        Ok(())
    }
}
