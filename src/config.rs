use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta3/models/chat-bison-001:generateMessage";
pub const DEFAULT_MODEL: &str = "models/text-bison-001";

// Settings for the completion provider. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistantConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub request_timeout_secs: Option<u64>, // None leaves the transport default in place.
}

impl Default for AssistantConfig {
    fn default() -> Self {
        AssistantConfig {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl AssistantConfig {
    pub fn with_api_key(api_key: &str) -> Self {
        AssistantConfig {
            api_key: api_key.to_string(),
            ..Self::default()
        }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
