/// Camera capture abstraction
///
/// A `CameraSource` opens a live `CameraStream`; the acquirer owns the stream
/// and must `stop` it on every exit path. Snapshots are encoded to JPEG here.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::config::{CameraConfig, Facing};
use crate::error::{AcquireError, CameraError};
use crate::state::data::{EncodedImage, ImageMime};

/// JPEG quality for snapshots (same default as a browser canvas export)
const SNAPSHOT_QUALITY: u8 = 92;

/// One decoded video frame, tightly packed RGBA
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Increments with every new frame from the stream
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A live video stream
pub trait CameraStream: Send {
    /// Most recent frame, if any has arrived yet
    fn latest_frame(&self) -> Option<Frame>;

    /// Sequence number of the most recent frame, without copying it
    fn latest_sequence(&self) -> Option<u64>;

    /// Number of capture tracks still running (0 once stopped)
    fn active_tracks(&self) -> usize;

    /// Stop all tracks. Must be idempotent.
    fn stop(&mut self);
}

/// Something that can open camera streams (platform backend or test fake)
pub trait CameraSource: Send + Sync {
    /// Open a stream, preferring the given direction. Blocking.
    fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// Carries a freshly opened stream through a `Clone` GUI message
///
/// The first `take` wins; later clones see `None`.
#[derive(Clone)]
pub struct StreamSlot(Arc<Mutex<Option<Box<dyn CameraStream>>>>);

impl StreamSlot {
    pub fn new(stream: Box<dyn CameraStream>) -> Self {
        Self(Arc::new(Mutex::new(Some(stream))))
    }

    pub fn take(&self) -> Option<Box<dyn CameraStream>> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl fmt::Debug for StreamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StreamSlot")
    }
}

/// Open a stream off the UI thread
pub async fn open_stream(
    source: Arc<dyn CameraSource>,
    facing: Facing,
) -> Result<StreamSlot, CameraError> {
    tokio::task::spawn_blocking(move || source.open(facing))
        .await
        .map_err(|e| CameraError::Pipeline(format!("Task join error: {}", e)))?
        .map(StreamSlot::new)
}

/// Rasterize a frame and encode it as a JPEG data URI
pub fn encode_snapshot(frame: &Frame) -> Result<EncodedImage, AcquireError> {
    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone()).ok_or_else(|| {
        AcquireError::Encode(format!(
            "frame buffer does not match {}x{}",
            frame.width, frame.height
        ))
    })?;

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, SNAPSHOT_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| AcquireError::Encode(e.to_string()))?;

    log::info!(
        "📷 Captured {}x{} snapshot ({} KB)",
        frame.width,
        frame.height,
        jpeg.len() / 1024
    );

    Ok(EncodedImage::from_bytes(ImageMime::Jpeg, &jpeg))
}

/// Source used when no camera backend is compiled in
pub struct NoCamera;

impl CameraSource for NoCamera {
    fn open(&self, _facing: Facing) -> Result<Box<dyn CameraStream>, CameraError> {
        Err(CameraError::NoDevice)
    }
}

/// The camera backend for this build
#[cfg(feature = "camera")]
pub fn platform_source(config: &CameraConfig) -> Arc<dyn CameraSource> {
    Arc::new(super::gst::GstCameraSource::new(config.device.clone()))
}

/// The camera backend for this build
#[cfg(not(feature = "camera"))]
pub fn platform_source(_config: &CameraConfig) -> Arc<dyn CameraSource> {
    log::info!("Camera support not compiled in (enable the `camera` feature)");
    Arc::new(NoCamera)
}
