use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{ChatReply, ChatRequest, ChatResponseBody, ChatTransport, CsrfToken};
use crate::error::TransportError;

pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// Posts chat submissions to the page's form endpoint.
#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    endpoint: Url,
    csrf: Option<CsrfToken>,
}

impl HttpChatClient {
    pub fn new(endpoint: &str, csrf: Option<CsrfToken>) -> Result<Self, TransportError> {
        Ok(Self::with_client(Client::new(), Url::parse(endpoint)?, csrf))
    }

    pub fn with_client(client: Client, endpoint: Url, csrf: Option<CsrfToken>) -> Self {
        Self {
            client,
            endpoint,
            csrf,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
            .form(request);
        if let Some(csrf) = &self.csrf {
            builder = builder.header(CSRF_HEADER, csrf.as_str());
        }

        tracing::debug!(endpoint = %self.endpoint, has_conversation = request.conversation_id.is_some(), "posting chat message");
        let response = builder.send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponseBody = serde_json::from_str(&body)
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
        parsed.into_reply()
    }
}
