/// Image file loader
///
/// Shared by the file picker and drag-and-drop. The extension check happens
/// synchronously in the acquirer; this module reads the bytes, confirms the
/// type from the content, and encodes the data URI.

use std::path::{Path, PathBuf};
use tokio::task;

use crate::error::AcquireError;
use crate::state::data::{EncodedImage, ImageMime};

/// Read and encode an image file
///
/// # Arguments
/// * `path` - File chosen in the picker or dropped on the window
/// * `max_bytes` - Size limit for uploads
///
/// # Returns
/// * `Ok(EncodedImage)` - The encoded image
/// * `Err(AcquireError)` - Unreadable, too large or not an accepted image type
pub async fn load_image_file(path: PathBuf, max_bytes: u64) -> Result<EncodedImage, AcquireError> {
    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|e| AcquireError::Read(format!("{}: {}", path.display(), e)))?;

    if !metadata.is_file() {
        return Err(AcquireError::Read(format!("{} is not a file", path.display())));
    }

    if metadata.len() > max_bytes {
        return Err(AcquireError::TooLarge {
            size: metadata.len(),
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AcquireError::Read(format!("{}: {}", path.display(), e)))?;

    let mime = detect_mime(&path, &bytes)?;

    // Base64 of a multi-megabyte photo is CPU work; keep it off the UI thread
    let image = task::spawn_blocking(move || EncodedImage::from_bytes(mime, &bytes))
        .await
        .map_err(|e| AcquireError::Read(format!("Task join error: {}", e)))?;

    log::info!(
        "📸 Loaded {} ({}, {} KB)",
        path.file_name().unwrap_or_default().to_string_lossy(),
        mime,
        metadata.len() / 1024
    );

    Ok(image)
}

/// Decide the image type of `bytes`
///
/// Sniffed content wins when it is recognized; otherwise the extension
/// (already checked by the acquirer) stands.
pub fn detect_mime(path: &Path, bytes: &[u8]) -> Result<ImageMime, AcquireError> {
    match infer::get(bytes) {
        Some(kind) => ImageMime::from_mime_str(kind.mime_type())
            .ok_or_else(|| AcquireError::UnsupportedType(kind.mime_type().to_string())),
        None => ImageMime::from_path(path).ok_or_else(|| {
            AcquireError::UnsupportedType(path.display().to_string())
        }),
    }
}
