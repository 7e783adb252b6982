//! GStreamer camera backend
//!
//! Pipeline: `<device source> ! videoconvert ! video/x-raw,format=RGBA ! appsink`.
//! The appsink keeps only the newest buffer; its callback copies each frame
//! into a shared slot the UI polls.

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::camera::{CameraSource, CameraStream, Frame};
use crate::config::Facing;
use crate::error::CameraError;

/// How long to wait for the device to start streaming
const START_TIMEOUT_SECS: u64 = 5;

pub struct GstCameraSource {
    /// Device display name from config, overrides auto-selection
    device: Option<String>,
}

impl GstCameraSource {
    pub fn new(device: Option<String>) -> Self {
        Self { device }
    }

    /// Pick a video source device
    ///
    /// Configured name first, then one whose name/properties match the
    /// preferred facing, then whatever comes first.
    fn select_device(&self, facing: Facing) -> Result<gst::Device, CameraError> {
        let monitor = gst::DeviceMonitor::new();
        monitor.add_filter(Some("Video/Source"), None);
        monitor
            .start()
            .map_err(|e| CameraError::Pipeline(format!("Failed to start device monitor: {}", e)))?;
        let devices: Vec<gst::Device> = monitor.devices().into_iter().collect();
        monitor.stop();

        log::debug!("Found {} video source(s)", devices.len());

        if let Some(wanted) = &self.device {
            return devices
                .into_iter()
                .find(|d| d.display_name().as_str() == wanted)
                .ok_or(CameraError::NoDevice);
        }

        let hints: &[&str] = match facing {
            Facing::Environment => &["back", "rear", "environment", "world"],
            Facing::User => &["front", "user", "face"],
        };

        let matches_facing = |device: &gst::Device| {
            let mut haystack = device.display_name().to_lowercase();
            if let Some(props) = device.properties() {
                haystack.push(' ');
                haystack.push_str(&props.to_string().to_lowercase());
            }
            hints.iter().any(|hint| haystack.contains(hint))
        };

        let preferred = devices.iter().position(matches_facing).unwrap_or(0);
        devices.into_iter().nth(preferred).ok_or(CameraError::NoDevice)
    }
}

impl CameraSource for GstCameraSource {
    fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>, CameraError> {
        gst::init().map_err(|e| CameraError::Pipeline(format!("Failed to initialize GStreamer: {}", e)))?;

        let device = self.select_device(facing)?;
        log::info!("🎥 Opening camera: {}", device.display_name());

        let source = device
            .create_element(None)
            .map_err(|e| CameraError::Pipeline(format!("Failed to create camera source: {}", e)))?;

        let convert = gst::ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| CameraError::Pipeline(format!("Failed to create videoconvert element: {}", e)))?;

        let caps = gst::Caps::builder("video/x-raw").field("format", "RGBA").build();
        let sink = gst_app::AppSink::builder()
            .caps(&caps)
            .max_buffers(1)
            .drop(true)
            .sync(false)
            .build();

        let pipeline = gst::Pipeline::new();
        pipeline
            .add_many([&source, &convert, sink.upcast_ref()])
            .map_err(|e| CameraError::Pipeline(e.to_string()))?;
        gst::Element::link_many([&source, &convert, sink.upcast_ref()])
            .map_err(|e| CameraError::Pipeline(e.to_string()))?;

        let latest = Arc::new(Mutex::new(None));
        let sequence = Arc::new(AtomicU64::new(0));
        let slot = latest.clone();

        sink.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    let frame = frame_from_sample(&sample, sequence.fetch_add(1, Ordering::Relaxed) + 1)
                        .ok_or(gst::FlowError::Error)?;
                    if let Ok(mut slot) = slot.lock() {
                        *slot = Some(frame);
                    }
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        let mut stream = GstCameraStream {
            pipeline,
            latest,
            running: true,
        };

        // Permission and busy-device failures surface while going to Playing
        if let Err(e) = stream.start() {
            stream.stop();
            return Err(e);
        }

        Ok(Box::new(stream))
    }
}

pub struct GstCameraStream {
    pipeline: gst::Pipeline,
    latest: Arc<Mutex<Option<Frame>>>,
    running: bool,
}

impl GstCameraStream {
    fn start(&self) -> Result<(), CameraError> {
        let changed = self.pipeline.set_state(gst::State::Playing);
        let (settled, _, _) = self
            .pipeline
            .state(gst::ClockTime::from_seconds(START_TIMEOUT_SECS));

        if changed.is_ok() && settled.is_ok() {
            return Ok(());
        }

        Err(self.bus_error().unwrap_or_else(|| {
            CameraError::Pipeline("Camera did not start streaming".to_string())
        }))
    }

    /// Translate the first error message on the bus
    fn bus_error(&self) -> Option<CameraError> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[gst::MessageType::Error])?;
        let gst::MessageView::Error(err) = msg.view() else {
            return None;
        };

        let error = err.error();
        let detail = format!("{} ({})", error, err.debug().unwrap_or_default());
        log::warn!("⚠️  Camera pipeline error: {}", detail);

        if error.matches(gst::ResourceError::NotAuthorized)
            || error.matches(gst::ResourceError::OpenRead)
            || error.matches(gst::ResourceError::OpenReadWrite)
        {
            Some(CameraError::PermissionDenied(detail))
        } else if error.matches(gst::ResourceError::NotFound) {
            Some(CameraError::NoDevice)
        } else {
            Some(CameraError::Pipeline(detail))
        }
    }
}

impl CameraStream for GstCameraStream {
    fn latest_frame(&self) -> Option<Frame> {
        self.latest.lock().ok()?.clone()
    }

    fn latest_sequence(&self) -> Option<u64> {
        self.latest.lock().ok()?.as_ref().map(|frame| frame.sequence)
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.running)
    }

    fn stop(&mut self) {
        if !self.running {
            return;
        }
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            log::warn!("⚠️  Failed to stop camera pipeline: {}", e);
        }
        self.running = false;
        if let Ok(mut slot) = self.latest.lock() {
            *slot = None;
        }
        log::info!("🎥 Camera released");
    }
}

impl Drop for GstCameraStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Copy a mapped RGBA sample into a tightly packed frame
fn frame_from_sample(sample: &gst::Sample, sequence: u64) -> Option<Frame> {
    let buffer = sample.buffer()?;
    let info = gst_video::VideoInfo::from_caps(sample.caps()?).ok()?;
    let map = buffer.map_readable().ok()?;

    let width = info.width();
    let height = info.height();
    let stride = usize::try_from(*info.stride().first()?).ok()?;
    let row_bytes = width as usize * 4;

    let mut rgba = Vec::with_capacity(row_bytes * height as usize);
    for row in map.as_slice().chunks(stride).take(height as usize) {
        rgba.extend_from_slice(row.get(..row_bytes)?);
    }

    Some(Frame {
        sequence,
        width,
        height,
        rgba,
    })
}
