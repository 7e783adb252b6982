use iced::widget::image::Handle;
use iced::widget::{button, column, container, image, row, scrollable, text, Column};
use iced::{event, time, window, Alignment, Element, Event, Length, Size, Subscription, Task, Theme};
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod acquire;
mod config;
mod error;
mod identify;
mod state;
mod ui;

use acquire::camera::{CameraSource, StreamSlot};
use acquire::{Acquirer, Admission};
use config::Config;
use error::{AcquireError, CameraError, IdentifyError};
use identify::Identifier;
use state::data::{EncodedImage, IdentificationResult, ImageMime};
use state::session::{Completion, Phase, Session};
use ui::toast::{Toasts, TOAST_DURATION};

/// Camera preview refresh interval (~30 fps)
const CAMERA_TICK: Duration = Duration::from_millis(33);

/// Main application state
struct NatureId {
    config: Config,
    /// The identification backend, or why it could not be set up
    identifier: Result<Identifier, IdentifyError>,
    camera_source: Arc<dyn CameraSource>,
    acquirer: Acquirer,
    session: Session,
    /// The submitted image as shown on the Loading and result pages
    preview: Option<Handle>,
    /// Latest camera frame while capturing, tagged with its sequence number
    camera_frame: Option<(u64, Handle)>,
    toasts: Toasts,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Upload from Device"
    PickFile,
    /// A file drag entered the window
    FileHovered,
    /// The drag left without dropping
    FilesHoveredLeft,
    FileDropped(PathBuf),
    /// Background file read completed
    FileLoaded(Result<EncodedImage, AcquireError>),
    /// User clicked "Use Camera"
    StartCamera,
    CameraOpened(Result<StreamSlot, CameraError>),
    /// Time to refresh the live preview
    CameraTick,
    CaptureFrame,
    CancelCamera,
    /// Identification call finished (ticket, outcome)
    Identified(u64, Result<IdentificationResult, IdentifyError>),
    /// "Try again" / "Identify Another Species"
    Reset,
    DismissToast(u64),
    CloseRequested,
}

impl NatureId {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        // A broken config file is not fatal; fall back to defaults
        let config = Config::load().unwrap_or_else(|e| {
            log::error!("⚠️  {}; using default settings", e);
            let mut config = Config::default();
            config.apply_env(|key| std::env::var(key).ok());
            config
        });

        let identifier = Identifier::from_config(&config.identifier);
        match &identifier {
            Ok(_) => log::info!("🌿 NatureID initialized ({:?} backend)", config.identifier.backend),
            Err(e) => log::error!("⚠️  Identification unavailable: {}", e),
        }

        let camera_source = acquire::camera::platform_source(&config.camera);

        (
            NatureId {
                config,
                identifier,
                camera_source,
                acquirer: Acquirer::new(),
                session: Session::new(),
                preview: None,
                camera_frame: None,
                toasts: Toasts::default(),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFile => {
                if !self.session.accepts_images() {
                    return Task::none();
                }

                // Show the native file picker
                let file = FileDialog::new()
                    .set_title("Choose a photo to identify")
                    .add_filter("Images", &ImageMime::EXTENSIONS)
                    .pick_file();

                match file {
                    Some(path) => {
                        let admission = self.acquirer.admit_file(&path);
                        self.read_file(path, admission)
                    }
                    None => Task::none(),
                }
            }
            Message::FileHovered => {
                self.acquirer.drag_enter();
                Task::none()
            }
            Message::FilesHoveredLeft => {
                self.acquirer.drag_leave();
                Task::none()
            }
            Message::FileDropped(path) => {
                if !self.session.accepts_images() {
                    self.acquirer.drag_leave();
                    return Task::none();
                }
                let admission = self.acquirer.admit_drop(&path);
                self.read_file(path, admission)
            }
            Message::FileLoaded(result) => match self.acquirer.file_loaded(result) {
                Ok(image) => self.identify(image),
                Err(e) => {
                    alert(&e);
                    Task::none()
                }
            },
            Message::StartCamera => {
                if !self.session.accepts_images() || !self.acquirer.start_camera() {
                    return Task::none();
                }

                log::info!("🎥 Requesting camera");
                Task::perform(
                    acquire::camera::open_stream(self.camera_source.clone(), self.config.camera.facing),
                    Message::CameraOpened,
                )
            }
            Message::CameraOpened(result) => {
                if let Err(e) = self.acquirer.camera_opened(result.map(|slot| slot.take())) {
                    alert(&e);
                }
                Task::none()
            }
            Message::CameraTick => {
                let shown = self.camera_frame.as_ref().map(|(sequence, _)| *sequence);
                if let Some(frame) = self.acquirer.fresh_frame(shown) {
                    let handle = Handle::from_rgba(frame.width, frame.height, frame.rgba);
                    self.camera_frame = Some((frame.sequence, handle));
                }
                Task::none()
            }
            Message::CaptureFrame => match self.acquirer.snapshot() {
                Ok(image) => {
                    self.camera_frame = None;
                    self.identify(image)
                }
                Err(AcquireError::CameraNotReady) => {
                    log::debug!("Capture pressed before the first frame");
                    Task::none()
                }
                Err(e) => {
                    self.camera_frame = None;
                    alert(&e);
                    Task::none()
                }
            },
            Message::CancelCamera => {
                self.acquirer.cancel_camera();
                self.camera_frame = None;
                Task::none()
            }
            Message::Identified(ticket, outcome) => match self.session.complete(ticket, outcome) {
                Completion::Failed => self.notify(
                    "Error Identifying Species",
                    "Could not identify the species. Please try another image.",
                ),
                Completion::Identified | Completion::Stale => Task::none(),
            },
            Message::Reset => {
                self.session.reset();
                self.preview = None;
                Task::none()
            }
            Message::DismissToast(id) => {
                self.toasts.dismiss(id);
                Task::none()
            }
            Message::CloseRequested => {
                // Never leave the camera running past the window
                self.acquirer.cancel_camera();
                iced::exit()
            }
        }
    }

    /// Start reading an admitted file, or alert on a rejected one
    fn read_file(&mut self, path: PathBuf, admission: Result<Admission, AcquireError>) -> Task<Message> {
        match admission {
            Ok(Admission::Load) => Task::perform(
                acquire::file::load_image_file(path, self.config.upload.max_bytes),
                Message::FileLoaded,
            ),
            Ok(Admission::Busy) => Task::none(),
            Err(e) => {
                alert(&e);
                Task::none()
            }
        }
    }

    /// Hand an acquired image to the session and launch the identification call
    fn identify(&mut self, image: EncodedImage) -> Task<Message> {
        self.preview = if image.mime().can_preview() {
            image.decode().ok().map(Handle::from_bytes)
        } else {
            log::info!("No preview available for {} images", image.mime());
            None
        };

        let request = self.session.submit(image);
        let ticket = request.ticket;

        match &self.identifier {
            Ok(identifier) => Task::perform(identifier.clone().identify(request), move |outcome| {
                Message::Identified(ticket, outcome)
            }),
            Err(e) => Task::done(Message::Identified(ticket, Err(e.clone()))),
        }
    }

    /// Show a toast and schedule its expiry
    fn notify(&mut self, title: &str, body: &str) -> Task<Message> {
        let id = self.toasts.push(title, body);
        Task::perform(tokio::time::sleep(TOAST_DURATION), move |_| Message::DismissToast(id))
    }

    /// Window events (drag & drop, close) plus the camera refresh timer
    fn subscription(&self) -> Subscription<Message> {
        let window_events = event::listen_with(|event, _status, _id| match event {
            Event::Window(window::Event::FileHovered(_)) => Some(Message::FileHovered),
            Event::Window(window::Event::FilesHoveredLeft) => Some(Message::FilesHoveredLeft),
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            Event::Window(window::Event::CloseRequested) => Some(Message::CloseRequested),
            _ => None,
        });

        if self.acquirer.is_capturing() {
            Subscription::batch([
                window_events,
                time::every(CAMERA_TICK).map(|_| Message::CameraTick),
            ])
        } else {
            window_events
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let body: Element<Message> = match self.session.phase() {
            Phase::Idle => column![
                title_header(),
                ui::uploader::view(&self.acquirer, self.camera_frame.as_ref().map(|(_, handle)| handle)),
            ]
            .spacing(32)
            .align_x(Alignment::Center)
            .into(),
            Phase::Loading => {
                let mut loading = column![
                    text("Analyzing your image...").size(28),
                    text("Our AI is working its magic to identify the species.").style(text::secondary),
                ]
                .spacing(12)
                .align_x(Alignment::Center);

                loading = match &self.preview {
                    Some(handle) => loading.push(
                        image(handle.clone())
                            .width(Length::Fixed(320.0))
                            .height(Length::Fixed(256.0)),
                    ),
                    None => loading.push(text("Preview unavailable").size(14).style(text::secondary)),
                };
                loading.into()
            }
            Phase::Failed(message) => column![
                title_header(),
                text(message).style(text::danger),
                button("Try again").on_press(Message::Reset).padding([8, 20]),
            ]
            .spacing(16)
            .align_x(Alignment::Center)
            .into(),
            Phase::Identified(result) => ui::result::view(result, self.preview.as_ref(), Message::Reset),
        };

        let mut content: Column<Message> = Column::new();

        if !self.toasts.is_empty() {
            content = content.push(
                row![
                    iced::widget::Space::with_width(Length::Fill),
                    ui::toast::view(&self.toasts),
                ]
                .padding(16),
            );
        }

        let content = content
            .push(scrollable(container(body).center_x(Length::Fill).padding(32)).height(Length::Fill))
            .push(
                container(text("NatureID").size(12).style(text::secondary))
                    .center_x(Length::Fill)
                    .padding(8),
            );

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn title_header<'a>() -> Element<'a, Message> {
    column![
        text("NatureID").size(56),
        text("Upload an image to identify any species.").size(18).style(text::secondary),
    ]
    .spacing(8)
    .align_x(Alignment::Center)
    .into()
}

/// Blocking alert for acquisition failures
fn alert(error: &AcquireError) {
    log::warn!("⚠️  {}", error);
    let _ = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("NatureID")
        .set_description(error.alert_message())
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application("NatureID", NatureId::update, NatureId::view)
        .subscription(NatureId::subscription)
        .theme(NatureId::theme)
        .window(window::Settings {
            size: Size::new(1100.0, 820.0),
            exit_on_close_request: false,
            ..window::Settings::default()
        })
        .centered()
        .run_with(NatureId::new)
}
