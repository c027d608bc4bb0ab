use iced::widget::image::Handle;
use iced::widget::{button, checkbox, column, container, row, scrollable, text, text_input, Column};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod cloud;
mod config;
mod error;
mod orchestrator;
mod state;
mod ui;

use cloud::{Cloudinary, HttpFetcher};
use config::Config;
use error::ReplaceError;
use orchestrator::Orchestrator;
use state::data::{ComparisonResult, UploadedImage};
use state::request::ReplacementRequest;
use state::upload::ImageExtension;
use ui::compare::{self, Comparison};

type LiveOrchestrator = Orchestrator<Cloudinary, HttpFetcher>;

/// The picked image and its display handle
struct Selected {
    image: UploadedImage,
    handle: Handle,
    caption: String,
}

/// Main application state
struct GenReplace {
    orchestrator: Arc<LiveOrchestrator>,
    /// Currently picked image, if any
    selected: Option<Selected>,
    /// Text fields and options
    request: ReplacementRequest,
    /// Last successful result
    comparison: Option<Comparison>,
    /// A submission is in flight; it cannot be cancelled
    busy: bool,
    /// Status message to display to the user
    status: String,
    /// Error of the last interaction
    error: Option<String>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Upload an image"
    PickImage,
    /// Picked image stored, read back and decoded
    ImageLoaded(Result<UploadedImage, ReplaceError>),
    ItemChanged(String),
    ReplaceWithChanged(String),
    PreserveGeometryToggled(bool),
    ReplaceAllToggled(bool),
    /// User clicked "Replace Item"
    Replace,
    /// Background submission finished
    ReplaceFinished(Result<ComparisonResult, ReplaceError>),
}

impl GenReplace {
    fn new(orchestrator: LiveOrchestrator) -> (Self, Task<Message>) {
        (
            GenReplace {
                orchestrator: Arc::new(orchestrator),
                selected: None,
                request: ReplacementRequest::default(),
                comparison: None,
                busy: false,
                status: "Upload a jpg, jpeg or png image to get started.".to_string(),
                error: None,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImage => {
                let picked = FileDialog::new()
                    .set_title("Upload an image")
                    .add_filter("Images", &ImageExtension::ALL[..])
                    .pick_file();

                let Some(path) = picked else {
                    return Task::none();
                };

                let extension = match ImageExtension::from_path(&path) {
                    Ok(ext) => ext,
                    Err(e) => {
                        self.error = Some(e.user_message());
                        return Task::none();
                    }
                };

                let bytes = match std::fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Could not read picked file");
                        self.error = Some(format!("Could not read {}: {}", path.display(), e));
                        return Task::none();
                    }
                };

                let display_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();

                self.status = format!("Loading {}...", display_name);
                self.error = None;
                self.comparison = None;

                let orchestrator = Arc::clone(&self.orchestrator);
                Task::perform(
                    async move {
                        orchestrator
                            .preview_upload(display_name, bytes, extension.as_str())
                            .await
                    },
                    Message::ImageLoaded,
                )
            }
            Message::ImageLoaded(Ok(image)) => {
                self.status = format!(
                    "Loaded {} ({}×{}).",
                    image.display_name, image.image.width, image.image.height
                );
                self.selected = Some(Selected {
                    handle: compare::handle(&image.image),
                    caption: compare::caption("Uploaded Image", &image.image),
                    image,
                });
                Task::none()
            }
            Message::ImageLoaded(Err(e)) => {
                warn!(error = %e, "Picked file rejected");
                self.selected = None;
                self.status = "Upload a jpg, jpeg or png image to get started.".to_string();
                self.error = Some(e.user_message());
                Task::none()
            }
            Message::ItemChanged(value) => {
                self.request.item_to_replace = value;
                Task::none()
            }
            Message::ReplaceWithChanged(value) => {
                self.request.replace_with = value;
                Task::none()
            }
            Message::PreserveGeometryToggled(value) => {
                self.request.preserve_geometry = value;
                Task::none()
            }
            Message::ReplaceAllToggled(value) => {
                self.request.replace_all = value;
                Task::none()
            }
            Message::Replace => {
                if self.busy {
                    return Task::none();
                }
                let Some((bytes, extension)) = self
                    .selected
                    .as_ref()
                    .map(|s| (s.image.image.bytes.clone(), s.image.extension))
                else {
                    return Task::none();
                };

                // Cheap check before spawning anything
                if let Err(e) = self.request.validate() {
                    self.error = Some(e.user_message());
                    return Task::none();
                }

                self.busy = true;
                self.error = None;
                self.comparison = None;
                self.status = format!(
                    "Replacing \"{}\" with \"{}\"...",
                    self.request.item_to_replace.trim(),
                    self.request.replace_with.trim()
                );

                let orchestrator = Arc::clone(&self.orchestrator);
                let request = self.request.clone();

                Task::perform(
                    async move {
                        orchestrator
                            .run_interaction(&bytes, extension.as_str(), &request)
                            .await
                    },
                    Message::ReplaceFinished,
                )
            }
            Message::ReplaceFinished(Ok(result)) => {
                self.busy = false;
                info!(url = %result.transformed_url, "Showing comparison");
                self.comparison = Some(Comparison::new(&result));
                self.status = format!("✅ Replacement complete ({}).", result.public_id);
                Task::none()
            }
            Message::ReplaceFinished(Err(e)) => {
                self.busy = false;
                warn!(error = %e, status = ?e.status(), "Replacement failed");
                self.status = if e.is_retryable() {
                    "Replacement failed. Adjust the fields and try again.".to_string()
                } else {
                    "Replacement failed.".to_string()
                };
                self.error = Some(e.user_message());
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let mut content: Column<Message> = column![
            text("Image Replace with Cloudinary's Gen Fill").size(36),
            button("Upload an image")
                .on_press_maybe((!self.busy).then_some(Message::PickImage))
                .padding(10),
            text(&self.status).size(16),
        ]
        .spacing(20)
        .padding(40)
        .align_x(Alignment::Center);

        if let Some(selected) = &self.selected {
            // The comparison shows the original itself
            if self.comparison.is_none() {
                content = content.push(
                    container(compare::captioned(&selected.handle, &selected.caption))
                        .max_width(720),
                );
            }

            let inputs = column![
                text_input("Item to Replace", &self.request.item_to_replace)
                    .on_input(Message::ItemChanged)
                    .padding(8),
                text_input("Replace With", &self.request.replace_with)
                    .on_input(Message::ReplaceWithChanged)
                    .on_submit(Message::Replace)
                    .padding(8),
                row![
                    checkbox("Preserve geometry", self.request.preserve_geometry)
                        .on_toggle(Message::PreserveGeometryToggled),
                    checkbox("Replace all instances", self.request.replace_all)
                        .on_toggle(Message::ReplaceAllToggled),
                ]
                .spacing(20),
                button(if self.busy { "Replacing..." } else { "Replace Item" })
                    .on_press_maybe((!self.busy).then_some(Message::Replace))
                    .padding(10),
            ]
            .spacing(12)
            .max_width(720);

            content = content.push(inputs);
        }

        if let Some(message) = &self.error {
            content = content.push(text(message).size(16).style(text::danger));
        }

        if let Some(comparison) = &self.comparison {
            content = content.push(comparison.view());
        }

        scrollable(
            container(content)
                .width(Length::Fill)
                .center_x(Length::Fill),
        )
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Log and exit; only used before the window opens
fn fail_startup(err: ReplaceError) -> ! {
    error!(error = %err, "Startup failed");
    eprintln!("{}", err.user_message());
    std::process::exit(2);
}

fn main() -> iced::Result {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().unwrap_or_else(|e| fail_startup(e));
    let orchestrator = Orchestrator::from_config(&config).unwrap_or_else(|e| fail_startup(e));

    info!(
        cloud = %config.credentials.cloud_name,
        temp_dir = %orchestrator.temp_dir().display(),
        timeout_secs = config.request_timeout.as_secs(),
        purge_remote = config.purge_remote,
        "Gen Replace initialized"
    );

    iced::application(
        "Image Replace with Cloudinary's Gen Fill",
        GenReplace::update,
        GenReplace::view,
    )
    .theme(GenReplace::theme)
    .centered()
    .run_with(move || GenReplace::new(orchestrator))
}
