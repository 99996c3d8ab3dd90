//! VoiceFlow core — native client engine for the VoiceFlow assistant.
//!
//! Driven by a UI shell via JSON-line IPC on stdin/stdout: commands in,
//! events out. Handles mode switching, TTS submission, microphone capture
//! with backend transcription, and the persisted interaction history.

mod audio;
mod backend;
mod config;
mod history;
mod ipc;
mod logging;

use chrono::Local;
use tracing::{info, warn};

use audio::recorder::RecordingSession;
use backend::{BackendClient, TtsRequest};
use config::AssistantConfig;
use history::{HistoryStore, Mode, SttEntry, TtsEntry};
use ipc::bridge::{emit_error, emit_event, spawn_stdin_reader};
use ipc::{AssistantCommand, AssistantEvent};

#[tokio::main]
async fn main() {
    logging::init();

    // Emit starting event immediately so the UI knows we're alive.
    emit_event(&AssistantEvent::Starting {});

    let config = config::read_config();
    info!(?config, "Configuration loaded");

    let data_dir = config::paths::get_data_dir();
    let store = HistoryStore::load(&data_dir);
    let backend = BackendClient::new(&config.backend_url);

    let mut app = App {
        mode: Mode::Tts,
        stt_language: config.default_stt_language.clone(),
        config,
        backend,
        store,
        session: None,
    };

    // Spawn stdin reader (blocking thread -> async channel)
    let mut cmd_rx = spawn_stdin_reader();

    emit_event(&AssistantEvent::Ready {});
    info!("VoiceFlow core ready");

    // Main loop: commands are handled strictly one at a time, so no two
    // history mutations are ever concurrently in flight.
    loop {
        match cmd_rx.recv().await {
            Some(cmd) => {
                if !app.handle_command(cmd).await {
                    break; // Stop command received
                }
            }
            None => {
                // stdin closed — parent process gone
                info!("stdin closed, shutting down");
                break;
            }
        }
    }

    info!("VoiceFlow core shutting down");
}

/// All per-process state: current mode, the history store, the backend
/// client, and the active recording session if any.
struct App {
    mode: Mode,
    config: AssistantConfig,
    backend: BackendClient,
    store: HistoryStore,
    session: Option<RecordingSession>,
    /// Language selected when the active recording started.
    stt_language: String,
}

impl App {
    /// Handle a single command from the UI.
    /// Returns `false` if the main loop should exit.
    async fn handle_command(&mut self, cmd: AssistantCommand) -> bool {
        match cmd {
            AssistantCommand::Ping {} => {
                emit_event(&AssistantEvent::Pong {});
            }

            AssistantCommand::Stop {} => {
                emit_event(&AssistantEvent::Stopping {});
                return false;
            }

            AssistantCommand::SetMode { mode } => self.handle_set_mode(mode),

            AssistantCommand::Speak {
                text,
                src_language,
                tgt_language,
                gender,
            } => {
                self.handle_speak(text, src_language, tgt_language, gender)
                    .await;
            }

            AssistantCommand::StartRecording { language } => {
                self.handle_start_recording(language);
            }

            AssistantCommand::StopRecording {} => {
                self.handle_stop_recording().await;
            }

            AssistantCommand::ShowHistory { mode } => self.emit_history(mode),

            AssistantCommand::ClearHistory {} => match self.store.clear() {
                Ok(()) => emit_event(&AssistantEvent::HistoryCleared {}),
                Err(e) => emit_error(&format!("Failed to clear history: {e}")),
            },

            AssistantCommand::ListVoices {} => match self.backend.list_voices().await {
                Ok(voices) => emit_event(&AssistantEvent::VoiceList { voices }),
                Err(e) => emit_error(&e.to_string()),
            },

            AssistantCommand::ListAudioDevices {} => {
                emit_event(&AssistantEvent::AudioDevices {
                    input: audio::list_devices(),
                });
            }
        }

        true
    }

    fn handle_set_mode(&mut self, mode: Mode) {
        if self.session.is_some() {
            emit_error("Cannot switch modes while a recording is in progress");
            return;
        }
        self.mode = mode;
        info!(mode = %mode, "Mode changed");
        emit_event(&AssistantEvent::ModeChange { mode });
    }

    /// Validate and submit a TTS request; a success appends to history.
    async fn handle_speak(
        &mut self,
        text: String,
        src_language: Option<String>,
        tgt_language: Option<String>,
        gender: Option<String>,
    ) {
        if self.mode != Mode::Tts {
            emit_error("Speak is only available in TTS mode");
            return;
        }

        let text = text.trim().to_string();
        if text.is_empty() {
            emit_error("Please enter some text to speak");
            return;
        }

        let src = src_language.unwrap_or_else(|| self.config.default_src_language.clone());
        let tgt = tgt_language.unwrap_or_else(|| self.config.default_tgt_language.clone());
        if !config::is_supported_language(&src) || !config::is_supported_language(&tgt) {
            emit_error("Unsupported language selection");
            return;
        }

        let gender = gender
            .map(|g| g.to_lowercase())
            .unwrap_or_else(|| self.config.default_gender.clone());
        if !config::GENDER_CHOICES.contains(&gender.as_str()) {
            emit_error("Unsupported gender preference");
            return;
        }

        let request = TtsRequest {
            text: text.clone(),
            src_language: src.clone(),
            tgt_language: tgt.clone(),
            gender: gender.clone(),
        };

        match self.backend.synthesize(&request).await {
            Ok(resp) => {
                emit_event(&AssistantEvent::TtsResult {
                    translated_text: resp.translated_text.clone(),
                    voice_used: resp.voice_used.clone(),
                    gender_used: resp.gender_used.clone(),
                    audio_url: resp.audio_url.clone(),
                    audio_filename: resp.audio_filename.clone(),
                    warning: resp.warning,
                });

                let entry = TtsEntry {
                    original_text: text,
                    translated_text: resp.translated_text,
                    src_language: src,
                    tgt_language: tgt,
                    voice: resp.voice_used,
                    gender: resp.gender_used.unwrap_or(gender),
                    timestamp: display_timestamp(),
                    audio_url: resp.audio_url,
                    audio_filename: resp.audio_filename,
                };
                if let Err(e) = self.store.append_tts(entry) {
                    self.warn_persist_failure(&e);
                }
                self.emit_history(Mode::Tts);
            }
            Err(e) => emit_error(&e.to_string()),
        }
    }

    fn handle_start_recording(&mut self, language: Option<String>) {
        if self.mode != Mode::Stt {
            emit_error("Recording is only available in STT mode");
            return;
        }
        if self.session.is_some() {
            emit_error("A recording is already in progress");
            return;
        }

        let language = language.unwrap_or_else(|| self.config.default_stt_language.clone());
        if !config::is_supported_language(&language) {
            emit_error("Unsupported language selection");
            return;
        }

        match RecordingSession::start(self.config.input_device.as_deref()) {
            Ok(session) => {
                self.stt_language = language;
                self.session = Some(session);
                emit_event(&AssistantEvent::RecordingStart {});
            }
            Err(e) => emit_error(&format!("Could not access microphone: {e}")),
        }
    }

    /// Finish the active recording, send it for recognition, and append
    /// the transcription to history.
    async fn handle_stop_recording(&mut self) {
        let Some(session) = self.session.take() else {
            emit_error("No recording in progress");
            return;
        };
        emit_event(&AssistantEvent::RecordingStop {});

        let clip = match session.finish() {
            Ok(clip) => clip,
            Err(e) => {
                emit_error(&e.to_string());
                return;
            }
        };

        info!(
            bytes = clip.data.len(),
            duration_secs = clip.duration_secs,
            "Clip ready for recognition"
        );

        let language = self.stt_language.clone();
        match self.backend.transcribe(clip, &language).await {
            Ok(text) => {
                emit_event(&AssistantEvent::Transcription {
                    text: text.clone(),
                    language: language.clone(),
                });

                let entry = SttEntry {
                    recognized_text: text,
                    language,
                    timestamp: display_timestamp(),
                };
                if let Err(e) = self.store.append_stt(entry) {
                    self.warn_persist_failure(&e);
                }
                self.emit_history(Mode::Stt);
            }
            Err(e) => emit_error(&e.to_string()),
        }
    }

    /// Emit the current list for one mode as a `history` event.
    fn emit_history(&self, mode: Mode) {
        let entries = match mode {
            Mode::Tts => {
                let list: Vec<_> = self.store.render_tts().map(|(_, e)| e).collect();
                serde_json::to_value(list)
            }
            Mode::Stt => {
                let list: Vec<_> = self.store.render_stt().map(|(_, e)| e).collect();
                serde_json::to_value(list)
            }
        };
        match entries {
            Ok(entries) => emit_event(&AssistantEvent::History { mode, entries }),
            Err(e) => emit_error(&format!("Failed to render history: {e}")),
        }
    }

    /// History persist failures are surfaced as a non-fatal warning; the
    /// entry is already in memory so the view stays current.
    fn warn_persist_failure(&self, e: &anyhow::Error) {
        warn!("History persist failed: {e:#}");
        emit_event(&AssistantEvent::Warning {
            message: format!("History could not be saved: {e}"),
        });
    }
}

/// Display-formatted local time for history entries.
fn display_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_timestamp_format() {
        let ts = display_timestamp();
        // e.g. "2026-08-23 14:05:09"
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }
}
