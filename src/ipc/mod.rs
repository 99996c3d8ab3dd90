//! IPC protocol types for communication with the UI shell.
//!
//! Events use `{"event": "<name>", "data": {...}}` format (core -> UI).
//! Commands use `{"command": "<name>", ...}` format (UI -> core).

pub mod bridge;

use serde::{Deserialize, Serialize};

use crate::backend::VoiceInfo;
use crate::history::Mode;

// ---------------------------------------------------------------------------
// Events: core -> UI (stdout)
// ---------------------------------------------------------------------------

/// All events emitted to the UI via stdout as JSON lines.
///
/// Serialized as `{"event": "<variant>", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum AssistantEvent {
    Starting {},
    Ready {},
    Pong {},
    Stopping {},
    ModeChange {
        mode: Mode,
    },
    RecordingStart {},
    RecordingStop {},
    TtsResult {
        translated_text: Option<String>,
        voice_used: Option<String>,
        gender_used: Option<String>,
        audio_url: Option<String>,
        audio_filename: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    Transcription {
        text: String,
        language: String,
    },
    History {
        mode: Mode,
        entries: serde_json::Value,
    },
    HistoryCleared {},
    VoiceList {
        voices: Vec<VoiceInfo>,
    },
    AudioDevices {
        input: Vec<String>,
    },
    /// Non-fatal problem the UI may show without interrupting the user,
    /// e.g. a history persist failure.
    Warning {
        message: String,
    },
    Error {
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Commands: UI -> core (stdin)
// ---------------------------------------------------------------------------

/// All commands received from the UI via stdin as JSON lines.
///
/// Deserialized from `{"command": "<variant>", ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command")]
#[serde(rename_all = "snake_case")]
pub enum AssistantCommand {
    SetMode {
        mode: Mode,
    },
    Speak {
        text: String,
        #[serde(default)]
        src_language: Option<String>,
        #[serde(default)]
        tgt_language: Option<String>,
        #[serde(default)]
        gender: Option<String>,
    },
    StartRecording {
        #[serde(default)]
        language: Option<String>,
    },
    StopRecording {},
    ShowHistory {
        mode: Mode,
    },
    ClearHistory {},
    ListVoices {},
    ListAudioDevices {},
    Ping {},
    Stop {},
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(&AssistantEvent::Ready {}).unwrap();
        assert_eq!(json["event"], "ready");

        let json = serde_json::to_value(&AssistantEvent::Transcription {
            text: "hello".into(),
            language: "english".into(),
        })
        .unwrap();
        assert_eq!(json["event"], "transcription");
        assert_eq!(json["data"]["text"], "hello");
        assert_eq!(json["data"]["language"], "english");
    }

    #[test]
    fn test_tts_result_omits_absent_warning() {
        let json = serde_json::to_value(&AssistantEvent::TtsResult {
            translated_text: Some("привет".into()),
            voice_used: None,
            gender_used: None,
            audio_url: None,
            audio_filename: None,
            warning: None,
        })
        .unwrap();
        assert!(json["data"].get("warning").is_none());
    }

    #[test]
    fn test_command_deserialization() {
        let cmd: AssistantCommand = serde_json::from_str(
            r#"{"command": "speak", "text": "hi", "tgt_language": "kazakh"}"#,
        )
        .unwrap();
        match cmd {
            AssistantCommand::Speak {
                text,
                src_language,
                tgt_language,
                ..
            } => {
                assert_eq!(text, "hi");
                assert!(src_language.is_none());
                assert_eq!(tgt_language.as_deref(), Some("kazakh"));
            }
            other => panic!("wrong command: {other:?}"),
        }

        let cmd: AssistantCommand =
            serde_json::from_str(r#"{"command": "set_mode", "mode": "stt"}"#).unwrap();
        match cmd {
            AssistantCommand::SetMode { mode } => assert_eq!(mode, Mode::Stt),
            other => panic!("wrong command: {other:?}"),
        }
    }
}
