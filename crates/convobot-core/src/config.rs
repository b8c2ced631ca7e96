use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConvoError, Result};

/// Top-level configuration for the ConvoBot client.
///
/// Loaded from `~/.convobot/config.toml` by default. Each section corresponds
/// to one subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvoConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl ConvoConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConvoConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConvoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend REST API.
    pub base_url: String,
    /// Bearer token attached to every request. Acquisition is out of scope;
    /// typically injected from the environment.
    pub auth_token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            auth_token: None,
        }
    }
}

/// Chat pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Model identifier forwarded to the answering service.
    pub model_choice: String,
    /// Number of conversation summaries fetched per list refresh.
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model_choice: "gemini".to_string(),
            history_limit: 20,
        }
    }
}

/// Recording and attachment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Maximum staged attachment size in bytes.
    pub max_attachment_bytes: usize,
    /// MIME type of finalized recordings.
    pub audio_mime_type: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_attachment_bytes: 50 * 1024 * 1024,
            audio_mime_type: "audio/webm".to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConvoConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert!(config.backend.auth_token.is_none());
        assert_eq!(config.chat.model_choice, "gemini");
        assert_eq!(config.chat.history_limit, 20);
        assert_eq!(config.capture.max_attachment_bytes, 50 * 1024 * 1024);
        assert_eq!(config.capture.audio_mime_type, "audio/webm");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ConvoConfig::default();
        config.backend.base_url = "https://api.example.com".to_string();
        config.chat.history_limit = 50;
        config.save(&path).unwrap();

        let loaded = ConvoConfig::load(&path).unwrap();
        assert_eq!(loaded.backend.base_url, "https://api.example.com");
        assert_eq!(loaded.chat.history_limit, 50);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ConvoConfig::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ConvoConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_load_or_default_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not [[[ toml").unwrap();

        let config = ConvoConfig::load_or_default(&path);
        assert_eq!(config.chat.model_choice, "gemini");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nbase_url = \"http://localhost:9999\"\n").unwrap();

        let config = ConvoConfig::load(&path).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:9999");
        // Unspecified sections fall back to defaults.
        assert_eq!(config.chat.model_choice, "gemini");
        assert_eq!(config.capture.max_attachment_bytes, 50 * 1024 * 1024);
    }
}
