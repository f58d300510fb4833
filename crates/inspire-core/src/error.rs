//! Error types for the chat client.

use thiserror::Error;

/// A request that could not complete, as opposed to a server that answered
/// with an application-level error.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, TLS or body-read failure inside reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered outside the 2xx range.
    #[error("unexpected status {status}")]
    Status { status: u16 },

    /// 2xx response whose body was not one of the recognised shapes.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Status code when the failure was a non-success HTTP status.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status } => Some(*status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Failure of an upload or transcription call.
#[derive(Error, Debug)]
pub enum AttachmentError {
    /// Server reported `success: false`; message is server-authored.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<reqwest::Error> for AttachmentError {
    fn from(e: reqwest::Error) -> Self {
        AttachmentError::Transport(TransportError::Http(e))
    }
}

impl From<std::io::Error> for AttachmentError {
    fn from(e: std::io::Error) -> Self {
        AttachmentError::Transport(TransportError::Io(e))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
