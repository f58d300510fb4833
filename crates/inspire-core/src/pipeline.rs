//! Chat submission pipeline.
//!
//! A submission moves through fixed stages: compose and optimistically
//! render ([`ChatController::begin_submit`]), deliver over a
//! [`ChatTransport`], then reconcile ([`ChatController::settle`]). Front-ends
//! that run the request elsewhere (a spawned task, a worker) call the stages
//! separately; [`ChatController::submit`] runs them in sequence.
//!
//! Only one request may be outstanding. While one is in flight
//! `begin_submit` answers [`Submission::Busy`] and leaves the composer alone,
//! so placeholders can never pile up or settle out of order.

use crate::annotation;
use crate::client::{ChatReply, ChatRequest, ChatTransport, UploadedFile};
use crate::composer::Composer;
use crate::config::ChatSettings;
use crate::conversation::{ConversationId, PageLocation};
use crate::error::TransportError;
use crate::state::{ChatMessage, ChatRole, PendingId, Transcript};

/// Shown in place of any transport failure; details go to the log.
pub const TRANSPORT_FAILURE_NOTICE: &str =
    "An error occurred while sending your message. Please try again.";

/// Result of asking to submit the composer.
#[derive(Debug)]
pub enum Submission {
    /// Nothing but whitespace; nothing happened.
    Blank,
    /// A request is still outstanding; nothing happened.
    Busy,
    /// The message is on screen and the request is ready to send.
    Started(PendingRequest),
}

/// A request whose placeholder is on screen, waiting to be delivered.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub pending: PendingId,
    pub request: ChatRequest,
}

/// How a submission settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// An assistant reply was appended.
    Replied { conversation_changed: bool },
    /// The server reported an error; its text was appended verbatim.
    Rejected { error: String },
    /// The request did not complete; the generic notice was appended.
    Failed,
}

/// View-controller for one transcript view.
#[derive(Debug)]
pub struct ChatController {
    settings: ChatSettings,
    composer: Composer,
    transcript: Transcript,
    conversation: Option<ConversationId>,
    location: PageLocation,
    image_preview: Option<String>,
    uploads: Vec<UploadedFile>,
    in_flight: Option<PendingId>,
    pinned_to_bottom: bool,
}

impl ChatController {
    /// The conversation, if any, is taken from the location's query.
    pub fn new(settings: ChatSettings, location: PageLocation) -> Self {
        Self {
            settings,
            composer: Composer::new(settings.enable_auto_focus),
            transcript: Transcript::new(),
            conversation: location.conversation_id(),
            location,
            image_preview: None,
            uploads: Vec::new(),
            in_flight: None,
            pinned_to_bottom: settings.enable_auto_scroll,
        }
    }

    /// Seed the transcript with messages rendered before this view existed.
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.transcript = Transcript::with_history(history);
        self
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_pinned_to_bottom(&self) -> bool {
        self.pinned_to_bottom
    }

    pub fn image_preview(&self) -> Option<&str> {
        self.image_preview.as_deref()
    }

    /// Image that annotation replies are drawn against.
    pub fn set_image_preview(&mut self, image: Option<String>) {
        self.image_preview = image;
    }

    pub fn uploads(&self) -> &[UploadedFile] {
        &self.uploads
    }

    pub fn record_upload(&mut self, file: UploadedFile) {
        self.uploads.push(file);
    }

    /// Whether an Enter key press should submit rather than insert a newline.
    pub fn enter_submits(&self, shift: bool) -> bool {
        self.settings.enable_keyboard_shortcuts && !shift
    }

    /// Follow the newest entry, if auto-scroll is on.
    pub fn scroll_to_bottom(&mut self) {
        if self.settings.enable_auto_scroll {
            self.pinned_to_bottom = true;
        }
    }

    /// Explicit "jump to newest", regardless of settings.
    pub fn pin_to_bottom(&mut self) {
        self.pinned_to_bottom = true;
    }

    /// The user scrolled away from the newest entry.
    pub fn unpin(&mut self) {
        self.pinned_to_bottom = false;
    }

    /// Compose and optimistically render a submission.
    pub fn begin_submit(&mut self) -> Submission {
        if self.composer.is_blank() {
            return Submission::Blank;
        }
        if self.in_flight.is_some() {
            tracing::debug!("submission deferred: a request is still outstanding");
            return Submission::Busy;
        }

        let text = self.composer.take().trim().to_string();
        self.transcript
            .push(ChatMessage::user(text.clone(), self.settings.enable_markdown));
        let pending = self.transcript.begin_pending();
        self.in_flight = Some(pending);
        self.scroll_to_bottom();

        let request = ChatRequest {
            message: text,
            conversation_id: self.conversation.as_ref().map(|c| c.as_str().to_string()),
        };
        tracing::debug!(chars = request.message.chars().count(), "message submitted");

        Submission::Started(PendingRequest { pending, request })
    }

    /// Reconcile the transcript with the result of the request that owns
    /// `pending`. Returns `None` if that placeholder is already gone.
    pub fn settle(
        &mut self,
        pending: PendingId,
        result: Result<ChatReply, TransportError>,
    ) -> Option<SubmitOutcome> {
        if !self.transcript.remove_pending(pending) {
            tracing::warn!(?pending, "settle for unknown placeholder ignored");
            return None;
        }
        if self.in_flight == Some(pending) {
            self.in_flight = None;
        }

        let outcome = match result {
            Ok(ChatReply::Message {
                text,
                conversation_id,
            }) => {
                let message = self.assistant_message(text);
                self.transcript.push(message);

                let conversation_changed = match conversation_id {
                    Some(id) if self.conversation.as_ref() != Some(&id) => {
                        self.adopt_conversation(id);
                        true
                    }
                    _ => false,
                };
                SubmitOutcome::Replied {
                    conversation_changed,
                }
            }
            Ok(ChatReply::Error(error)) => {
                tracing::info!(%error, "server rejected message");
                self.transcript.push(ChatMessage::system_error(error.clone()));
                SubmitOutcome::Rejected { error }
            }
            Err(e) => {
                tracing::warn!(error = %e, status = ?e.status(), "chat request failed");
                self.transcript
                    .push(ChatMessage::system_error(TRANSPORT_FAILURE_NOTICE));
                SubmitOutcome::Failed
            }
        };

        self.scroll_to_bottom();
        Some(outcome)
    }

    /// Run every stage in order. `None` when nothing was submitted.
    pub async fn submit(&mut self, transport: &dyn ChatTransport) -> Option<SubmitOutcome> {
        let started = match self.begin_submit() {
            Submission::Started(started) => started,
            Submission::Blank | Submission::Busy => return None,
        };
        let result = transport.send(&started.request).await;
        self.settle(started.pending, result)
    }

    fn assistant_message(&self, text: String) -> ChatMessage {
        let mut message = ChatMessage::assistant(text, self.settings.enable_markdown);

        // Annotations only apply to a reply that directly answers the user.
        let answers_user = self
            .transcript
            .last_message()
            .map_or(false, |m| m.role == ChatRole::User);
        if let (Some(image), true) = (&self.image_preview, answers_user) {
            message.annotation = annotation::annotate(&message.content, image);
        }
        message
    }

    fn adopt_conversation(&mut self, id: ConversationId) {
        self.location = self.location.with_conversation(&id);
        tracing::info!(conversation = %id, location = %self.location, "conversation adopted");
        self.conversation = Some(id);
    }
}
