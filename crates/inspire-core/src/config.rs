use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_PAGE_URL: &str = "http://localhost:8000/chat/";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/chat/send/";
pub const DEFAULT_UPLOAD_PATH: &str = "/openai_integration/api/files/upload/";
pub const DEFAULT_TRANSCRIBE_PATH: &str = "/openai_integration/api/stt/";
pub const CSRF_ENV_VAR: &str = "INSPIRE_CSRF_TOKEN";

/// Per-view behaviour switches. Every option defaults to on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ChatSettings {
    /// Render `**bold**`, `*italic*` and `` `code` `` in messages.
    pub enable_markdown: bool,
    /// Enter (without Shift) submits the composer.
    pub enable_keyboard_shortcuts: bool,
    /// Pin the transcript to its newest entry after every change.
    pub enable_auto_scroll: bool,
    /// Focus the composer when the view opens and after each submit.
    pub enable_auto_focus: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            enable_markdown: true,
            enable_keyboard_shortcuts: true,
            enable_auto_scroll: true,
            enable_auto_focus: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Page the chat lives at; its `conversation_id` query names the
    /// conversation to resume.
    pub page_url: Option<String>,
    /// Chat submission endpoint.
    pub endpoint: Option<String>,
    pub upload_endpoint: Option<String>,
    pub transcribe_endpoint: Option<String>,
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub settings: ChatSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            page_url: Some(DEFAULT_PAGE_URL.to_string()),
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            upload_endpoint: None,
            transcribe_endpoint: None,
            csrf_token: None,
            settings: ChatSettings::default(),
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Remember where the conversation lives so the next launch resumes it.
    /// Rewrites only `page_url`; an unreadable file is an error and is left
    /// untouched.
    pub fn save_page_url_to(path: &Path, page_url: &str) -> Result<(), ConfigError> {
        let mut config = Self::load_from(path)?;
        config.page_url = Some(page_url.to_string());
        config.save_to(path)
    }

    pub fn page_url(&self) -> &str {
        self.page_url.as_deref().unwrap_or(DEFAULT_PAGE_URL)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn upload_endpoint(&self) -> &str {
        self.upload_endpoint.as_deref().unwrap_or(DEFAULT_UPLOAD_PATH)
    }

    pub fn transcribe_endpoint(&self) -> &str {
        self.transcribe_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_TRANSCRIBE_PATH)
    }

    /// Environment first, then the config file.
    pub fn csrf_token(&self) -> Option<String> {
        std::env::var(CSRF_ENV_VAR)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.csrf_token.clone())
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("inspire-chat").join("config.json"))
    }
}
