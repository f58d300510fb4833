pub mod attachments;
pub mod http;

pub use attachments::{AttachmentClient, UploadedFile};
pub use http::HttpChatClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::ConversationId;
use crate::error::TransportError;

/// Opaque anti-forgery credential read from the hosting page, forwarded verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CsrfToken(..)")
    }
}

/// Form body of one chat submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Raw JSON body of a chat response.
#[derive(Debug, Default, Deserialize)]
pub struct ChatResponseBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// A well-formed answer from the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Message {
        text: String,
        conversation_id: Option<ConversationId>,
    },
    /// The server reported an application-level failure.
    Error(String),
}

impl ChatResponseBody {
    /// A non-empty `error` wins; otherwise `message` must be present.
    pub fn into_reply(self) -> Result<ChatReply, TransportError> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Ok(ChatReply::Error(error));
        }
        match self.message {
            Some(text) => Ok(ChatReply::Message {
                text,
                conversation_id: self.conversation_id.and_then(ConversationId::new),
            }),
            None => Err(TransportError::MalformedResponse(
                "response has neither `message` nor `error`".to_string(),
            )),
        }
    }
}

/// Anything that can deliver a chat submission and bring back the reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> ChatResponseBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_success_reply() {
        let reply = body(r#"{"message": "hi there", "conversation_id": "abc123"}"#)
            .into_reply()
            .unwrap();
        assert_eq!(
            reply,
            ChatReply::Message {
                text: "hi there".into(),
                conversation_id: ConversationId::new("abc123"),
            }
        );
    }

    #[test]
    fn test_error_reply() {
        let reply = body(r#"{"error": "rate limited"}"#).into_reply().unwrap();
        assert_eq!(reply, ChatReply::Error("rate limited".into()));
    }

    #[test]
    fn test_empty_error_falls_through_to_message() {
        let reply = body(r#"{"error": "", "message": "ok"}"#).into_reply().unwrap();
        assert!(matches!(reply, ChatReply::Message { text, .. } if text == "ok"));
    }

    #[test]
    fn test_blank_conversation_id_ignored() {
        let reply = body(r#"{"message": "ok", "conversation_id": ""}"#)
            .into_reply()
            .unwrap();
        assert!(matches!(reply, ChatReply::Message { conversation_id: None, .. }));
    }

    #[test]
    fn test_empty_object_is_malformed() {
        let err = body("{}").into_reply().unwrap_err();
        assert!(matches!(err, TransportError::MalformedResponse(_)));
    }

    #[test]
    fn test_request_omits_missing_conversation() {
        let req = ChatRequest {
            message: "hello".into(),
            conversation_id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"message":"hello"}"#);
    }

    #[test]
    fn test_csrf_debug_is_redacted() {
        let token = CsrfToken::new("secret");
        assert!(!format!("{:?}", token).contains("secret"));
    }
}
