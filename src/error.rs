/// Error types for every fallible concern in the app
///
/// Errors travel inside GUI messages, so they must be `Clone`; underlying
/// library errors are flattened to their display strings.

use thiserror::Error;

/// Why an image could not be acquired (file, drop or camera)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcquireError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("Failed to read file: {0}")]
    Read(String),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Camera has not produced a frame yet")]
    CameraNotReady,

    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
}

impl AcquireError {
    /// Text for the blocking alert shown to the user
    pub fn alert_message(&self) -> &'static str {
        match self {
            AcquireError::UnsupportedType(_) => {
                "Please upload a valid image file (JPEG, PNG, HEIC, WEBP)."
            }
            AcquireError::TooLarge { .. } => {
                "This image is too large. Please choose a smaller file."
            }
            AcquireError::Read(_) => "Could not read the selected file.",
            AcquireError::Camera(_) | AcquireError::CameraNotReady => {
                "Could not access camera. Please ensure you have given permission."
            }
            AcquireError::Encode(_) => "Could not capture a photo from the camera.",
        }
    }
}

/// Failures opening or running a camera stream
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    #[error("No camera available")]
    NoDevice,

    #[error("Camera access denied: {0}")]
    PermissionDenied(String),

    #[error("Camera pipeline error: {0}")]
    Pipeline(String),
}

/// Failures of the remote identification call
///
/// The UI treats every variant the same; the detail only reaches the log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentifyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Malformed identification: {0}")]
    Malformed(String),

    #[error("No API key configured")]
    MissingApiKey,

    #[error("Identification backend not configured: {0}")]
    NotConfigured(String),
}

/// Failures loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
