use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use inspire_core::{
    AttachmentClient, AttachmentError, ChatController, ChatReply, ChatTransport, Config,
    CsrfToken, HttpChatClient, PageLocation, PendingId, PendingRequest, SubmitOutcome, Submission,
    TransportError, UploadedFile,
};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// One-line notice shown in the footer until replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

/// Composer lines starting with one of these run locally instead of being sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/upload <path>`
    Upload(PathBuf),
    /// `/transcribe <path> [language]`
    Transcribe { path: PathBuf, language: Option<String> },
    /// `/image [url]`; no url clears the preview.
    Image(Option<String>),
}

impl Command {
    /// `None` for anything that is not a well-formed command, which is then
    /// sent as an ordinary message.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (name, rest) = match text.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (text, ""),
        };

        match name {
            "/upload" if !rest.is_empty() => Some(Command::Upload(PathBuf::from(rest))),
            "/transcribe" => {
                let mut parts = rest.split_whitespace();
                let path = parts.next()?;
                let language = parts.next().map(str::to_string);
                if parts.next().is_some() {
                    return None;
                }
                Some(Command::Transcribe {
                    path: PathBuf::from(path),
                    language,
                })
            }
            "/image" => Some(Command::Image(
                Some(rest.to_string()).filter(|url| !url.is_empty()),
            )),
            _ => None,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub controller: ChatController,

    transport: Arc<dyn ChatTransport>,
    attachments: AttachmentClient,
    events: UnboundedSender<AppEvent>,

    // Transcript viewport, refreshed on every draw
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub chat_height: u16,
    pub chat_area: Option<Rect>,

    pub status: Option<StatusLine>,
    pub attachment_busy: bool,

    /// Config file an adopted conversation is written back to; `None` keeps
    /// it for this run only.
    pub location_store: Option<PathBuf>,

    // Animation state
    pub animation_frame: u8, // 0-2 for the typing indicator
}

impl App {
    /// `fresh` drops any conversation remembered in the page URL.
    pub fn new(
        config: &Config,
        fresh: bool,
        csrf_token: Option<String>,
        events: UnboundedSender<AppEvent>,
    ) -> Result<Self> {
        let location = PageLocation::parse(config.page_url())
            .with_context(|| format!("invalid page URL {}", config.page_url()))?;
        let location = if fresh { location.without_query() } else { location };

        let csrf = csrf_token.map(CsrfToken::new);
        if csrf.is_none() {
            tracing::warn!("no CSRF token configured; the server may refuse requests");
        }

        let transport = HttpChatClient::new(config.endpoint(), csrf.clone())
            .with_context(|| format!("invalid chat endpoint {}", config.endpoint()))?;
        let attachments = AttachmentClient::new(
            location.join(config.upload_endpoint())?,
            location.join(config.transcribe_endpoint())?,
            csrf,
        );

        Ok(Self::with_transport(config, location, Arc::new(transport), attachments, events))
    }

    pub fn with_transport(
        config: &Config,
        location: PageLocation,
        transport: Arc<dyn ChatTransport>,
        attachments: AttachmentClient,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let controller = ChatController::new(config.settings, location);
        let input_mode = if controller.composer().is_focused() {
            InputMode::Editing
        } else {
            InputMode::Normal
        };
        tracing::info!(
            location = %controller.location(),
            conversation = ?controller.conversation().map(|c| c.as_str()),
            "chat view opened"
        );

        Self {
            should_quit: false,
            input_mode,
            controller,
            transport,
            attachments,
            events,
            chat_scroll: 0,
            chat_max_scroll: 0,
            chat_height: 0,
            chat_area: None,
            status: None,
            attachment_busy: false,
            location_store: None,
            animation_frame: 0,
        }
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusLine {
            kind,
            text: text.into(),
        });
    }

    pub fn start_editing(&mut self) {
        self.input_mode = InputMode::Editing;
        self.controller.composer_mut().focus();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
        self.controller.composer_mut().blur();
    }

    /// Send the composer, or run it as a command.
    pub fn submit(&mut self) {
        if let Some(command) = Command::parse(self.controller.composer().text()) {
            self.controller.composer_mut().take();
            self.run_command(command);
            return;
        }

        match self.controller.begin_submit() {
            Submission::Started(PendingRequest { pending, request }) => {
                self.status = None;
                let transport = Arc::clone(&self.transport);
                let tx = self.events.clone();
                tokio::spawn(async move {
                    let result = transport.send(&request).await;
                    // Receiver is gone only when the app is shutting down
                    let _ = tx.send(AppEvent::ChatSettled { pending, result });
                });
            }
            Submission::Busy => {
                self.set_status(StatusKind::Info, "Still waiting for the previous reply");
            }
            Submission::Blank => {}
        }
    }

    pub fn settle(&mut self, pending: PendingId, result: Result<ChatReply, TransportError>) {
        match self.controller.settle(pending, result) {
            Some(SubmitOutcome::Replied {
                conversation_changed: true,
            }) => self.remember_location(),
            Some(SubmitOutcome::Failed) => {
                self.set_status(StatusKind::Error, "Request failed; see the log for details");
            }
            _ => {}
        }
    }

    fn remember_location(&mut self) {
        let Some(path) = &self.location_store else {
            return;
        };
        let location = self.controller.location().as_str();
        match Config::save_page_url_to(path, location) {
            Ok(()) => tracing::debug!(%location, "conversation location saved"),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "could not remember conversation location");
                self.set_status(
                    StatusKind::Error,
                    "Config file unreadable; this conversation will not be resumed",
                );
            }
        }
    }

    pub fn run_command(&mut self, command: Command) {
        match command {
            Command::Upload(path) => self.start_upload(path),
            Command::Transcribe { path, language } => self.start_transcription(path, language),
            Command::Image(Some(url)) => {
                self.set_status(StatusKind::Info, format!("Annotating replies against {}", url));
                self.controller.set_image_preview(Some(url));
            }
            Command::Image(None) => {
                self.controller.set_image_preview(None);
                self.set_status(StatusKind::Info, "Image preview cleared");
            }
        }
    }

    fn start_upload(&mut self, path: PathBuf) {
        if self.attachment_busy {
            self.set_status(StatusKind::Info, "Another attachment is still in progress");
            return;
        }
        self.attachment_busy = true;
        self.set_status(StatusKind::Info, format!("Uploading {}...", display_name(&path)));

        let client = self.attachments.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.upload_file(&path, None, None).await;
            let _ = tx.send(AppEvent::Uploaded(result));
        });
    }

    fn start_transcription(&mut self, path: PathBuf, language: Option<String>) {
        if self.attachment_busy {
            self.set_status(StatusKind::Info, "Another attachment is still in progress");
            return;
        }
        self.attachment_busy = true;
        self.set_status(StatusKind::Info, format!("Transcribing {}...", display_name(&path)));

        let client = self.attachments.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.transcribe(&path, language.as_deref()).await;
            let _ = tx.send(AppEvent::Transcribed(result));
        });
    }

    pub fn finish_upload(&mut self, result: Result<UploadedFile, AttachmentError>) {
        self.attachment_busy = false;
        match result {
            Ok(file) => {
                self.set_status(
                    StatusKind::Info,
                    format!("File \"{}\" uploaded and available in this conversation", file.filename),
                );
                self.controller.record_upload(file);
            }
            Err(AttachmentError::Rejected(reason)) => {
                self.set_status(StatusKind::Error, format!("Upload failed: {}", reason));
            }
            Err(e) => {
                tracing::warn!(error = %e, "upload failed");
                self.set_status(StatusKind::Error, "Error uploading file. Please try again.");
            }
        }
    }

    /// A transcription lands in the composer for review; it is never sent
    /// on its own.
    pub fn finish_transcription(&mut self, result: Result<String, AttachmentError>) {
        self.attachment_busy = false;
        match result {
            Ok(text) => {
                self.controller.composer_mut().set_text(text);
                self.start_editing();
                self.set_status(StatusKind::Info, "Transcription ready, review it and send");
            }
            Err(AttachmentError::Rejected(reason)) => {
                self.set_status(StatusKind::Error, format!("Transcription failed: {}", reason));
            }
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                self.set_status(StatusKind::Error, "Transcription failed. Please try again.");
            }
        }
    }

    pub fn tick_animation(&mut self) {
        if self.controller.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.controller.unpin();
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Reaching the bottom pins the view again.
    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
        if self.chat_scroll >= self.chat_max_scroll {
            self.controller.pin_to_bottom();
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.controller.unpin();
        self.chat_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.controller.pin_to_bottom();
        self.chat_scroll = self.chat_max_scroll;
    }

    pub fn page_size(&self) -> u16 {
        self.chat_height.saturating_sub(1).max(1)
    }

    /// Called by the renderer once it knows how tall the transcript is.
    pub fn sync_scroll(&mut self, total_lines: u16, visible_height: u16) {
        self.chat_height = visible_height;
        self.chat_max_scroll = total_lines.saturating_sub(visible_height);
        if self.controller.is_pinned_to_bottom() {
            self.chat_scroll = self.chat_max_scroll;
        } else {
            self.chat_scroll = self.chat_scroll.min(self.chat_max_scroll);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
