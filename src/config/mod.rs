//! Configuration reading and language support.

pub mod paths;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use paths::get_data_dir;

/// Languages the backend accepts for both translation and transcription.
pub const SUPPORTED_LANGUAGES: &[&str] = &["english", "russian", "kazakh"];

/// Gender preferences accepted by the TTS backend.
pub const GENDER_CHOICES: &[&str] = &["any", "male", "female"];

/// Whether a language selection is one the backend supports.
pub fn is_supported_language(language: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&language)
}

/// Top-level assistant_config.json shape (written by the UI settings panel).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_language")]
    pub default_src_language: String,
    #[serde(default = "default_language")]
    pub default_tgt_language: String,
    #[serde(default = "default_language")]
    pub default_stt_language: String,
    #[serde(default = "default_gender")]
    pub default_gender: String,
    /// Input device name; `None` uses the system default microphone.
    #[serde(default)]
    pub input_device: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            default_src_language: default_language(),
            default_tgt_language: default_language(),
            default_stt_language: default_language(),
            default_gender: default_gender(),
            input_device: None,
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_language() -> String {
    "english".to_string()
}

fn default_gender() -> String {
    "any".to_string()
}

/// Read assistant_config.json from the data directory.
pub fn read_config() -> AssistantConfig {
    read_json_file(&get_config_path()).unwrap_or_default()
}

/// Path to assistant_config.json.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("assistant_config.json")
}

/// Generic helper: read a JSON file and deserialize it.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}
