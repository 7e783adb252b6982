/// Image acquisition module
///
/// This module handles:
/// - Reading and validating picked or dropped image files (file.rs)
/// - Camera streams and JPEG snapshots (camera.rs)
/// - The GStreamer camera backend (gst.rs, `camera` feature)
///
/// `Acquirer` holds the acquisition UI state (drag highlight, pending file
/// read, camera stream) and turns user gestures into at most one image each.

pub mod camera;
pub mod file;
#[cfg(feature = "camera")]
pub mod gst;

use std::path::Path;

use crate::error::{AcquireError, CameraError};
use crate::state::data::{EncodedImage, ImageMime};
use camera::{CameraStream, Frame};

/// Camera state owned by the acquirer
#[derive(Default)]
pub enum Capture {
    #[default]
    Off,
    /// Waiting for the platform to grant a stream
    Requesting,
    Live(Box<dyn CameraStream>),
}

/// Whether a picked/dropped file should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Load,
    /// Another file or the camera is in progress; ignore this one
    Busy,
}

#[derive(Default)]
pub struct Acquirer {
    capture: Capture,
    /// A drag is hovering over the window
    dragging: bool,
    /// A file read is in flight
    loading_file: bool,
    /// The current drag gesture already delivered its file
    drop_consumed: bool,
}

impl Acquirer {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Drag & drop / file picker ==========

    /// A drag started or moved over the window; begins a new drop gesture
    pub fn drag_enter(&mut self) {
        self.dragging = true;
        self.drop_consumed = false;
    }

    pub fn drag_leave(&mut self) {
        self.dragging = false;
        self.drop_consumed = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_loading_file(&self) -> bool {
        self.loading_file
    }

    /// Validate a picked or dropped file before reading it
    ///
    /// Rejections leave the acquirer untouched.
    pub fn admit_file(&mut self, path: &Path) -> Result<Admission, AcquireError> {
        self.dragging = false;

        if self.loading_file || !matches!(self.capture, Capture::Off) {
            log::debug!("Ignoring {} while another acquisition is running", path.display());
            return Ok(Admission::Busy);
        }

        if ImageMime::from_path(path).is_none() {
            return Err(AcquireError::UnsupportedType(path.display().to_string()));
        }

        self.loading_file = true;
        Ok(Admission::Load)
    }

    /// A file dropped on the window
    ///
    /// A multi-file drop arrives as one event per file. Only the first one of
    /// the gesture counts, whether it is accepted or rejected.
    pub fn admit_drop(&mut self, path: &Path) -> Result<Admission, AcquireError> {
        if self.drop_consumed {
            self.dragging = false;
            log::debug!("Ignoring extra dropped file {}", path.display());
            return Ok(Admission::Busy);
        }
        self.drop_consumed = true;
        self.admit_file(path)
    }

    /// The file read finished
    pub fn file_loaded(
        &mut self,
        result: Result<EncodedImage, AcquireError>,
    ) -> Result<EncodedImage, AcquireError> {
        self.loading_file = false;
        result
    }

    // ========== Camera ==========

    /// User asked for the camera. Returns true if a stream should be opened.
    pub fn start_camera(&mut self) -> bool {
        if self.loading_file || !matches!(self.capture, Capture::Off) {
            return false;
        }
        self.capture = Capture::Requesting;
        true
    }

    /// The platform answered the stream request
    ///
    /// A stream granted after the user cancelled is released immediately.
    pub fn camera_opened(
        &mut self,
        result: Result<Option<Box<dyn CameraStream>>, CameraError>,
    ) -> Result<(), AcquireError> {
        match result {
            Ok(Some(mut stream)) => {
                if matches!(self.capture, Capture::Requesting) {
                    log::info!("🎥 Camera streaming");
                    self.capture = Capture::Live(stream);
                } else {
                    log::debug!("Camera granted after cancel, releasing");
                    stream.stop();
                }
                Ok(())
            }
            Ok(None) => {
                if matches!(self.capture, Capture::Requesting) {
                    self.capture = Capture::Off;
                }
                Ok(())
            }
            Err(e) => {
                if !matches!(self.capture, Capture::Requesting) {
                    log::debug!("Camera request failed after cancel: {}", e);
                    return Ok(());
                }
                log::warn!("⚠️  Error accessing camera: {}", e);
                self.capture = Capture::Off;
                Err(AcquireError::Camera(e))
            }
        }
    }

    pub fn is_capturing(&self) -> bool {
        !matches!(self.capture, Capture::Off)
    }

    /// The newest preview frame, unless it is the one already shown
    pub fn fresh_frame(&self, shown: Option<u64>) -> Option<Frame> {
        let Capture::Live(stream) = &self.capture else {
            return None;
        };
        let latest = stream.latest_sequence()?;
        if shown == Some(latest) {
            return None;
        }
        stream.latest_frame()
    }

    /// Take a snapshot and release the camera
    ///
    /// With no frame yet the stream keeps running and `CameraNotReady` is
    /// returned; otherwise the stream is stopped whatever the encode result.
    pub fn snapshot(&mut self) -> Result<EncodedImage, AcquireError> {
        let Capture::Live(stream) = &self.capture else {
            return Err(AcquireError::CameraNotReady);
        };
        let frame = stream.latest_frame().ok_or(AcquireError::CameraNotReady)?;

        self.release_camera();
        camera::encode_snapshot(&frame)
    }

    /// Stop the stream (if any) without producing an image
    pub fn cancel_camera(&mut self) {
        self.release_camera();
    }

    fn release_camera(&mut self) {
        if let Capture::Live(mut stream) = std::mem::take(&mut self.capture) {
            stream.stop();
            let left = stream.active_tracks();
            if left > 0 {
                log::warn!("⚠️  {} camera track(s) still running after stop", left);
            }
        }
    }
}

impl Drop for Acquirer {
    fn drop(&mut self) {
        self.release_camera();
    }
}

#[cfg(test)]
mod tests {
    use super::camera::{CameraSource, StreamSlot};
    use super::*;
    use crate::config::Facing;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fake camera counting live tracks across all its streams
    struct FakeCamera {
        tracks: Arc<AtomicUsize>,
        frame: Option<Frame>,
    }

    struct FakeStream {
        tracks: Arc<AtomicUsize>,
        frame: Option<Frame>,
        running: bool,
    }

    impl FakeCamera {
        fn new(frame: Option<Frame>) -> Self {
            Self {
                tracks: Arc::new(AtomicUsize::new(0)),
                frame,
            }
        }

        fn live_tracks(&self) -> usize {
            self.tracks.load(Ordering::SeqCst)
        }
    }

    impl CameraSource for FakeCamera {
        fn open(&self, _facing: Facing) -> Result<Box<dyn CameraStream>, CameraError> {
            self.tracks.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeStream {
                tracks: self.tracks.clone(),
                frame: self.frame.clone(),
                running: true,
            }))
        }
    }

    impl CameraStream for FakeStream {
        fn latest_frame(&self) -> Option<Frame> {
            self.frame.clone()
        }

        fn latest_sequence(&self) -> Option<u64> {
            self.frame.as_ref().map(|frame| frame.sequence)
        }

        fn active_tracks(&self) -> usize {
            usize::from(self.running)
        }

        fn stop(&mut self) {
            if self.running {
                self.running = false;
                self.tracks.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    fn frame() -> Frame {
        Frame {
            sequence: 1,
            width: 8,
            height: 6,
            rgba: vec![128; 8 * 6 * 4],
        }
    }

    fn open(camera: &FakeCamera) -> Result<Option<Box<dyn CameraStream>>, CameraError> {
        camera
            .open(Facing::Environment)
            .map(|stream| StreamSlot::new(stream).take())
    }

    #[test]
    fn test_rejects_unsupported_extension_without_state_change() {
        let mut acquirer = Acquirer::new();
        for name in ["notes.txt", "clip.gif", "scan.pdf", "no_extension"] {
            let err = acquirer.admit_file(&PathBuf::from(name)).unwrap_err();
            assert!(matches!(err, AcquireError::UnsupportedType(_)));
            assert!(!acquirer.is_loading_file());
            assert!(!acquirer.is_capturing());
        }
    }

    #[test]
    fn test_second_drop_is_ignored_while_loading() {
        let mut acquirer = Acquirer::new();
        acquirer.drag_enter();
        assert!(acquirer.is_dragging());

        assert_eq!(acquirer.admit_file(Path::new("a.jpg")), Ok(Admission::Load));
        assert!(!acquirer.is_dragging());
        assert_eq!(acquirer.admit_file(Path::new("b.png")), Ok(Admission::Busy));

        let image = EncodedImage::from_bytes(ImageMime::Jpeg, &[0xFF, 0xD8]);
        assert_eq!(acquirer.file_loaded(Ok(image.clone())), Ok(image));
        assert!(!acquirer.is_loading_file());
        assert_eq!(acquirer.admit_file(Path::new("c.webp")), Ok(Admission::Load));
    }

    #[test]
    fn test_only_first_file_of_a_drop_counts() {
        let mut acquirer = Acquirer::new();
        acquirer.drag_enter();

        // notes.txt is rejected once; fox.jpg from the same drop is not read
        assert!(matches!(
            acquirer.admit_drop(Path::new("notes.txt")),
            Err(AcquireError::UnsupportedType(_))
        ));
        assert_eq!(acquirer.admit_drop(Path::new("fox.jpg")), Ok(Admission::Busy));
        assert_eq!(acquirer.admit_drop(Path::new("owl.png")), Ok(Admission::Busy));
        assert!(!acquirer.is_loading_file());

        // The next drag is a new gesture
        acquirer.drag_enter();
        assert_eq!(acquirer.admit_drop(Path::new("fox.jpg")), Ok(Admission::Load));
    }

    #[test]
    fn test_drag_leave_ends_the_drop_gesture() {
        let mut acquirer = Acquirer::new();
        acquirer.drag_enter();
        assert!(acquirer.admit_drop(Path::new("notes.txt")).is_err());
        acquirer.drag_leave();
        assert_eq!(acquirer.admit_drop(Path::new("fox.jpg")), Ok(Admission::Load));
    }

    #[test]
    fn test_failed_read_clears_loading() {
        let mut acquirer = Acquirer::new();
        acquirer.admit_file(Path::new("a.heic")).unwrap();
        let err = AcquireError::Read("gone".to_string());
        assert_eq!(acquirer.file_loaded(Err(err.clone())), Err(err));
        assert!(!acquirer.is_loading_file());
    }

    #[test]
    fn test_drag_leave_has_no_side_effects() {
        let mut acquirer = Acquirer::new();
        acquirer.drag_enter();
        acquirer.drag_leave();
        assert!(!acquirer.is_dragging());
        assert!(!acquirer.is_loading_file());
        assert!(!acquirer.is_capturing());
    }

    #[test]
    fn test_capture_releases_camera() {
        let camera = FakeCamera::new(Some(frame()));
        let mut acquirer = Acquirer::new();

        assert!(acquirer.start_camera());
        acquirer.camera_opened(open(&camera)).unwrap();
        assert_eq!(camera.live_tracks(), 1);

        let image = acquirer.snapshot().unwrap();
        assert_eq!(image.mime(), ImageMime::Jpeg);
        assert_eq!(camera.live_tracks(), 0);
        assert!(!acquirer.is_capturing());

        // One gesture, one image
        assert_eq!(acquirer.snapshot(), Err(AcquireError::CameraNotReady));
    }

    #[test]
    fn test_cancel_releases_camera() {
        let camera = FakeCamera::new(Some(frame()));
        let mut acquirer = Acquirer::new();

        acquirer.start_camera();
        acquirer.camera_opened(open(&camera)).unwrap();
        acquirer.cancel_camera();

        assert_eq!(camera.live_tracks(), 0);
        assert!(!acquirer.is_capturing());
    }

    #[test]
    fn test_snapshot_before_first_frame_keeps_streaming() {
        let camera = FakeCamera::new(None);
        let mut acquirer = Acquirer::new();

        acquirer.start_camera();
        acquirer.camera_opened(open(&camera)).unwrap();

        assert_eq!(acquirer.snapshot(), Err(AcquireError::CameraNotReady));
        assert!(acquirer.is_capturing());
        assert_eq!(camera.live_tracks(), 1);

        acquirer.cancel_camera();
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn test_grant_after_cancel_is_released() {
        let camera = FakeCamera::new(Some(frame()));
        let mut acquirer = Acquirer::new();

        acquirer.start_camera();
        acquirer.cancel_camera();
        acquirer.camera_opened(open(&camera)).unwrap();

        assert_eq!(camera.live_tracks(), 0);
        assert!(!acquirer.is_capturing());
    }

    #[test]
    fn test_failure_after_cancel_is_silent() {
        let mut acquirer = Acquirer::new();
        acquirer.start_camera();
        acquirer.cancel_camera();

        assert_eq!(acquirer.camera_opened(Err(CameraError::NoDevice)), Ok(()));
        assert!(!acquirer.is_capturing());
        assert!(acquirer.start_camera());
    }

    #[test]
    fn test_fresh_frame_skips_the_frame_already_shown() {
        let camera = FakeCamera::new(Some(frame()));
        let mut acquirer = Acquirer::new();
        assert_eq!(acquirer.fresh_frame(None), None);

        acquirer.start_camera();
        acquirer.camera_opened(open(&camera)).unwrap();

        let first = acquirer.fresh_frame(None).unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(acquirer.fresh_frame(Some(first.sequence)), None);
        assert_eq!(acquirer.fresh_frame(Some(0)), Some(frame()));
    }

    #[test]
    fn test_denied_camera_reverts() {
        let mut acquirer = Acquirer::new();
        acquirer.start_camera();

        let err = acquirer
            .camera_opened(Err(CameraError::PermissionDenied("nope".to_string())))
            .unwrap_err();

        assert!(matches!(err, AcquireError::Camera(CameraError::PermissionDenied(_))));
        assert!(!acquirer.is_capturing());
        assert!(acquirer.start_camera());
    }

    #[test]
    fn test_drop_releases_camera() {
        let camera = FakeCamera::new(Some(frame()));
        {
            let mut acquirer = Acquirer::new();
            acquirer.start_camera();
            acquirer.camera_opened(open(&camera)).unwrap();
            assert_eq!(camera.live_tracks(), 1);
        }
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn test_files_ignored_while_capturing() {
        let mut acquirer = Acquirer::new();
        acquirer.start_camera();
        assert_eq!(acquirer.admit_file(Path::new("a.jpg")), Ok(Admission::Busy));
        assert!(!acquirer.start_camera());
    }
}
