use crate::core::config::data::{ApiConfig, Config, StorageConfig, ThemeMode, UiConfig};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_CHAT_ENDPOINT: &str = "/api/chat";
pub const DEFAULT_MODELS_ENDPOINT: &str = "/api/tags";
pub const DEFAULT_CHATS_KEY: &str = "chats";
pub const DEFAULT_MODEL: &str = "llama2";
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 4000;
pub const DEFAULT_CHAT_TITLE_MAX_LENGTH: usize = 30;

pub const BASE_URL_ENV: &str = "OLLAMA_CHAT_BASE_URL";

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            models_endpoint: DEFAULT_MODELS_ENDPOINT.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            chats_key: DEFAULT_CHATS_KEY.to_string(),
            data_dir: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            chat_title_max_length: DEFAULT_CHAT_TITLE_MAX_LENGTH,
            theme: ThemeMode::Dark,
            syntax: true,
        }
    }
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "ollama-chat", "ollama-chat")
}

impl Config {
    /// Apply environment and command-line overrides, in that order.
    pub fn apply_overrides(&mut self, base_url: Option<String>) {
        if let Ok(env_url) = std::env::var(BASE_URL_ENV) {
            if !env_url.trim().is_empty() {
                self.api.base_url = env_url.trim().to_string();
            }
        }
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
    }

    pub fn is_light_theme(&self) -> bool {
        self.ui.theme == ThemeMode::Light
    }

    /// Directory the conversation collection lives in.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage
            .data_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
    }
}
