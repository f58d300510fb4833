pub mod annotation;
pub mod client;
pub mod composer;
pub mod config;
pub mod conversation;
pub mod error;
pub mod markup;
pub mod pipeline;
pub mod state;

// Re-export main types for convenience
pub use annotation::{Annotation, AnnotationKind, Overlay};
pub use client::{
    AttachmentClient, ChatReply, ChatRequest, ChatTransport, CsrfToken, HttpChatClient,
    UploadedFile,
};
pub use composer::Composer;
pub use config::{ChatSettings, Config};
pub use conversation::{ConversationId, PageLocation};
pub use error::{AttachmentError, ConfigError, TransportError};
pub use markup::{RichText, Segment};
pub use pipeline::{ChatController, PendingRequest, SubmitOutcome, Submission};
pub use state::{ChatMessage, ChatRole, Entry, PendingId, Transcript};
