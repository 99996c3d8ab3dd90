//! HTTP client for the VoiceFlow backend.
//!
//! Three endpoints:
//! - `POST /tts`  — JSON request, returns synthesis metadata and audio URL
//! - `POST /stt`  — multipart audio upload, returns recognized text
//! - `GET /list-voices` — voice inventory
//!
//! Failure statuses carry a JSON `{"error": "..."}` body; that message is
//! surfaced verbatim where present. No retries — a failed request is
//! reported once and the user decides whether to try again.

use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::AudioClip;

/// Client for one configured backend base URL.
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

/// Request body for `POST /tts`.
#[derive(Debug, Clone, Serialize)]
pub struct TtsRequest {
    pub text: String,
    pub src_language: String,
    pub tgt_language: String,
    pub gender: String,
}

/// Success body for `POST /tts`. Every field is optional; older backends
/// omit the ones they do not compute.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TtsResponse {
    #[serde(default)]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub voice_used: Option<String>,
    #[serde(default)]
    pub gender_used: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub audio_filename: Option<String>,
    /// Non-fatal, e.g. requested gender unavailable.
    #[serde(default)]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SttResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// One voice reported by `GET /list-voices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default = "unknown_gender")]
    pub gender: String,
}

fn unknown_gender() -> String {
    "unknown".to_string()
}

#[derive(Debug, Deserialize)]
struct VoiceListResponse {
    voices: Vec<VoiceInfo>,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Submit text for synthesis.
    pub async fn synthesize(&self, request: &TtsRequest) -> anyhow::Result<TtsResponse> {
        let url = format!("{}/tts", self.base_url);
        debug!(
            text_len = request.text.len(),
            src = %request.src_language,
            tgt = %request.tgt_language,
            "Sending TTS request"
        );

        let resp = self.client.post(&url).json(request).send().await?;
        if !resp.status().is_success() {
            return Err(decode_error(resp).await);
        }

        Ok(resp.json().await?)
    }

    /// Upload a recorded clip for transcription.
    pub async fn transcribe(&self, clip: AudioClip, language: &str) -> anyhow::Result<String> {
        let url = format!("{}/stt", self.base_url);
        debug!(
            bytes = clip.data.len(),
            language, "Sending audio for recognition"
        );

        let file_part = multipart::Part::bytes(clip.data)
            .file_name(clip.filename)
            .mime_str(clip.mime_type)?;

        let form = multipart::Form::new()
            .text("language", language.to_string())
            .part("audio", file_part);

        let resp = self.client.post(&url).multipart(form).send().await?;
        if !resp.status().is_success() {
            return Err(decode_error(resp).await);
        }

        let body: SttResponse = resp.json().await?;
        Ok(body.text)
    }

    /// Fetch the backend's voice inventory.
    pub async fn list_voices(&self) -> anyhow::Result<Vec<VoiceInfo>> {
        let url = format!("{}/list-voices", self.base_url);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(decode_error(resp).await);
        }

        let body: VoiceListResponse = resp.json().await?;
        Ok(body.voices)
    }
}

/// Turn a failure response into an error, preferring the backend's own
/// `{"error": ...}` message over the bare status.
async fn decode_error(resp: reqwest::Response) -> anyhow::Error {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(body) => anyhow::anyhow!("Backend error ({}): {}", status, body.error),
        Err(_) => anyhow::anyhow!("Backend error ({})", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tts_request_serializes_snake_case() {
        let req = TtsRequest {
            text: "hello".into(),
            src_language: "english".into(),
            tgt_language: "russian".into(),
            gender: "any".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["text"], "hello");
        assert_eq!(json["src_language"], "english");
        assert_eq!(json["tgt_language"], "russian");
        assert_eq!(json["gender"], "any");
    }

    #[test]
    fn test_tts_response_tolerates_missing_fields() {
        let resp: TtsResponse = serde_json::from_str(
            r#"{"success": true, "translated_text": "привет", "voice_used": "Irina"}"#,
        )
        .unwrap();
        assert_eq!(resp.translated_text.as_deref(), Some("привет"));
        assert_eq!(resp.voice_used.as_deref(), Some("Irina"));
        assert!(resp.audio_url.is_none());
        assert!(resp.warning.is_none());
    }

    #[test]
    fn test_voice_list_deserializes() {
        let body: VoiceListResponse = serde_json::from_str(
            r#"{"voices": [{"id": "v1", "name": "Irina", "languages": ["russian"]}]}"#,
        )
        .unwrap();
        assert_eq!(body.voices.len(), 1);
        assert_eq!(body.voices[0].gender, "unknown");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = BackendClient::new("http://voice.local:5000/");
        assert_eq!(client.base_url, "http://voice.local:5000");
    }
}
