//! File upload and speech-to-text endpoints.
//!
//! Both are single POST-and-await-JSON calls. A `success: false` body is an
//! application error; anything that keeps a well-formed body from arriving
//! is a transport error.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use super::http::CSRF_HEADER;
use super::CsrfToken;
use crate::error::{AttachmentError, TransportError};

pub const DEFAULT_PURPOSE: &str = "assistants";
const DEFAULT_AUDIO_NAME: &str = "recording.webm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_id: String,
    pub filename: String,
    pub size: Option<u64>,
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    file_id: Option<String>,
    filename: Option<String>,
    size: Option<u64>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    success: bool,
    transcription: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct AttachmentClient {
    client: Client,
    upload_url: Url,
    transcribe_url: Url,
    csrf: Option<CsrfToken>,
}

impl AttachmentClient {
    pub fn new(upload_url: Url, transcribe_url: Url, csrf: Option<CsrfToken>) -> Self {
        Self {
            client: Client::new(),
            upload_url,
            transcribe_url,
            csrf,
        }
    }

    /// Upload a file for use in the current conversation.
    pub async fn upload_file(
        &self,
        path: &Path,
        purpose: Option<&str>,
        message_id: Option<&str>,
    ) -> Result<UploadedFile, AttachmentError> {
        let bytes = tokio::fs::read(path).await?;
        let name = file_name(path).unwrap_or_else(|| "upload".to_string());

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(name))
            .text("purpose", purpose.unwrap_or(DEFAULT_PURPOSE).to_string());
        if let Some(id) = message_id {
            form = form.text("message_id", id.to_string());
        }

        let body: UploadResponse = self.post(self.upload_url.clone(), form).await?;
        if !body.success {
            return Err(AttachmentError::Rejected(
                body.error.unwrap_or_else(|| "Upload failed".to_string()),
            ));
        }

        match (body.file_id, body.filename) {
            (Some(file_id), Some(filename)) => {
                tracing::info!(%file_id, %filename, "file uploaded");
                Ok(UploadedFile {
                    file_id,
                    filename,
                    size: body.size,
                })
            }
            _ => Err(TransportError::MalformedResponse(
                "upload response is missing file_id or filename".to_string(),
            )
            .into()),
        }
    }

    /// Transcribe an audio file. The text is returned for the caller to
    /// place in the composer; nothing is sent to the chat.
    pub async fn transcribe(
        &self,
        path: &Path,
        language: Option<&str>,
    ) -> Result<String, AttachmentError> {
        let bytes = tokio::fs::read(path).await?;
        let name = file_name(path).unwrap_or_else(|| DEFAULT_AUDIO_NAME.to_string());
        self.transcribe_bytes(bytes, &name, language).await
    }

    pub async fn transcribe_bytes(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        language: Option<&str>,
    ) -> Result<String, AttachmentError> {
        let mut form = Form::new().part("audio", Part::bytes(audio).file_name(file_name.to_string()));
        if let Some(lang) = language.filter(|l| !l.is_empty()) {
            form = form.text("language", lang.to_string());
        }

        let body: TranscriptionResponse = self.post(self.transcribe_url.clone(), form).await?;
        if !body.success {
            return Err(AttachmentError::Rejected(
                body.error.unwrap_or_else(|| "Transcription failed".to_string()),
            ));
        }
        body.transcription.ok_or_else(|| {
            TransportError::MalformedResponse("transcription missing".to_string()).into()
        })
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        form: Form,
    ) -> Result<T, TransportError> {
        let mut builder = self.client.post(url).multipart(form);
        if let Some(csrf) = &self.csrf {
            builder = builder.header(CSRF_HEADER, csrf.as_str());
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
