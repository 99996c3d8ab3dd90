//! Bounded, persisted interaction history.
//!
//! Two independent most-recent-first lists, one per assistant mode, each
//! capped at 50 entries and stored as its own JSON record in the data
//! directory:
//! - `ttsHistory.json` — array of [`TtsEntry`]
//! - `sttHistory.json` — array of [`SttEntry`]
//!
//! Field names are serialized in camelCase to stay compatible with records
//! written by earlier VoiceFlow clients.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum entries kept per mode. The oldest entry is evicted past this.
const MAX_ENTRIES: usize = 50;

const TTS_RECORD: &str = "ttsHistory.json";
const STT_RECORD: &str = "sttHistory.json";

/// Which assistant mode an interaction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Tts,
    Stt,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tts => write!(f, "tts"),
            Self::Stt => write!(f, "stt"),
        }
    }
}

/// One completed TTS interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsEntry {
    pub original_text: String,
    pub translated_text: Option<String>,
    pub src_language: String,
    pub tgt_language: String,
    pub voice: Option<String>,
    pub gender: String,
    /// Display-formatted local time, not sortable.
    pub timestamp: String,
    pub audio_url: Option<String>,
    pub audio_filename: Option<String>,
}

/// One completed STT interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SttEntry {
    pub recognized_text: String,
    pub language: String,
    pub timestamp: String,
}

/// Owns both history lists and their on-disk records.
///
/// Instantiated once per process via [`HistoryStore::load`]; all mutation
/// goes through `append_*` and `clear`, each of which persists before
/// returning.
pub struct HistoryStore {
    data_dir: PathBuf,
    tts: Vec<TtsEntry>,
    stt: Vec<SttEntry>,
}

impl HistoryStore {
    /// Load both records from `data_dir`.
    ///
    /// Fails soft: a missing, unreadable, or corrupt record becomes an
    /// empty list. This is intentional — history is a convenience and is
    /// never worth failing startup over.
    pub fn load(data_dir: &Path) -> Self {
        let tts = read_record(&data_dir.join(TTS_RECORD));
        let stt = read_record(&data_dir.join(STT_RECORD));
        debug!(tts = tts.len(), stt = stt.len(), "History loaded");
        Self {
            data_dir: data_dir.to_path_buf(),
            tts,
            stt,
        }
    }

    /// Prepend a TTS entry, evict the oldest past capacity, persist the
    /// full list, and return it for immediate rendering.
    ///
    /// On a persist failure the entry stays in memory so the view keeps
    /// showing it; the error is returned for the caller to surface as a
    /// non-fatal warning.
    pub fn append_tts(&mut self, entry: TtsEntry) -> anyhow::Result<&[TtsEntry]> {
        self.tts.insert(0, entry);
        self.tts.truncate(MAX_ENTRIES);
        write_record(&self.data_dir, TTS_RECORD, &self.tts)?;
        Ok(&self.tts)
    }

    /// STT counterpart of [`HistoryStore::append_tts`].
    pub fn append_stt(&mut self, entry: SttEntry) -> anyhow::Result<&[SttEntry]> {
        self.stt.insert(0, entry);
        self.stt.truncate(MAX_ENTRIES);
        write_record(&self.data_dir, STT_RECORD, &self.stt)?;
        Ok(&self.stt)
    }

    /// Empty both lists and remove both records.
    ///
    /// Memory is cleared before touching the disk, so a failed delete can
    /// never leave stale entries visible to the view.
    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.tts.clear();
        self.stt.clear();
        let tts = remove_record(&self.data_dir.join(TTS_RECORD));
        let stt = remove_record(&self.data_dir.join(STT_RECORD));
        tts.and(stt)
    }

    /// Current TTS list for display, most recent first. Restartable and
    /// side-effect free.
    pub fn render_tts(&self) -> impl Iterator<Item = (usize, &TtsEntry)> {
        self.tts.iter().enumerate()
    }

    /// Current STT list for display, most recent first.
    pub fn render_stt(&self) -> impl Iterator<Item = (usize, &SttEntry)> {
        self.stt.iter().enumerate()
    }
}

/// Read a JSON array record, collapsing every failure to an empty list.
fn read_record<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(list) => list,
            Err(e) => {
                warn!("Corrupt history record {}: {}", path.display(), e);
                Vec::new()
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            Vec::new()
        }
    }
}

/// Atomic write: temp file in the same directory, then rename.
fn write_record<T: Serialize>(dir: &Path, name: &str, list: &[T]) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    let tmp = dir.join(format!(".{}.{}.tmp", name, std::process::id()));
    let json = serde_json::to_string(list)?;
    std::fs::write(&tmp, &json)?;
    std::fs::rename(&tmp, dir.join(name))?;
    Ok(())
}

/// Remove a record file; a record that never existed is not an error.
fn remove_record(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Failed to remove {}: {}", path.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tts_entry(label: &str) -> TtsEntry {
        TtsEntry {
            original_text: label.to_string(),
            translated_text: Some(format!("{label} (translated)")),
            src_language: "english".into(),
            tgt_language: "russian".into(),
            voice: Some("Irina".into()),
            gender: "female".into(),
            timestamp: "2026-08-23 12:00:00".into(),
            audio_url: Some(format!("/audio/{label}.wav")),
            audio_filename: Some(format!("{label}.wav")),
        }
    }

    fn stt_entry(label: &str) -> SttEntry {
        SttEntry {
            recognized_text: label.to_string(),
            language: "english".into(),
            timestamp: "2026-08-23 12:00:00".into(),
        }
    }

    #[test]
    fn test_append_then_render_shows_entry_at_index_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::load(dir.path());

        store.append_tts(tts_entry("first")).unwrap();
        store.append_tts(tts_entry("second")).unwrap();

        let rendered: Vec<_> = store.render_tts().collect();
        assert_eq!(rendered[0].0, 0);
        assert_eq!(rendered[0].1.original_text, "second");
        assert_eq!(rendered[1].1.original_text, "first");
    }

    #[test]
    fn test_eviction_keeps_50_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::load(dir.path());

        for i in 1..=51 {
            store.append_tts(tts_entry(&format!("entry_{i}"))).unwrap();
        }

        let entries: Vec<_> = store.render_tts().map(|(_, e)| e).collect();
        assert_eq!(entries.len(), 50);
        assert_eq!(entries.first().unwrap().original_text, "entry_51");
        assert_eq!(entries.last().unwrap().original_text, "entry_2");

        // The eviction must also hold in the persisted record.
        let reloaded = HistoryStore::load(dir.path());
        let persisted: Vec<_> = reloaded.render_tts().map(|(_, e)| e.clone()).collect();
        assert_eq!(persisted.len(), 50);
        assert_eq!(persisted[0].original_text, "entry_51");
        assert_eq!(persisted[49].original_text, "entry_2");
    }

    #[test]
    fn test_round_trip_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let entry = tts_entry("persisted");

        let mut store = HistoryStore::load(dir.path());
        store.append_tts(entry.clone()).unwrap();
        drop(store);

        let reloaded = HistoryStore::load(dir.path());
        let first = reloaded.render_tts().next().unwrap().1;
        assert_eq!(*first, entry);
    }

    #[test]
    fn test_clear_empties_lists_and_removes_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::load(dir.path());

        for i in 0..10 {
            store.append_tts(tts_entry(&format!("t{i}"))).unwrap();
        }
        for i in 0..5 {
            store.append_stt(stt_entry(&format!("s{i}"))).unwrap();
        }

        store.clear().unwrap();
        assert_eq!(store.render_tts().count(), 0);
        assert_eq!(store.render_stt().count(), 0);
        assert!(!dir.path().join(TTS_RECORD).exists());
        assert!(!dir.path().join(STT_RECORD).exists());

        let reloaded = HistoryStore::load(dir.path());
        assert_eq!(reloaded.render_tts().count(), 0);
        assert_eq!(reloaded.render_stt().count(), 0);
    }

    #[test]
    fn test_clear_on_empty_store_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::load(dir.path());
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_record_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TTS_RECORD), "{not valid json").unwrap();
        std::fs::write(dir.path().join(STT_RECORD), "[{\"wrong\": true}]").unwrap();

        let store = HistoryStore::load(dir.path());
        assert_eq!(store.render_tts().count(), 0);
        assert_eq!(store.render_stt().count(), 0);
    }

    #[test]
    fn test_lists_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::load(dir.path());

        store.append_stt(stt_entry("spoken")).unwrap();
        assert_eq!(store.render_tts().count(), 0);
        assert_eq!(store.render_stt().count(), 1);
        assert!(!dir.path().join(TTS_RECORD).exists());
        assert!(dir.path().join(STT_RECORD).exists());
    }

    #[test]
    fn test_record_fields_serialize_in_camel_case() {
        let json = serde_json::to_string(&tts_entry("hello")).unwrap();
        assert!(json.contains("\"originalText\""));
        assert!(json.contains("\"translatedText\""));
        assert!(json.contains("\"srcLanguage\""));
        assert!(json.contains("\"audioFilename\""));

        let json = serde_json::to_string(&stt_entry("hello")).unwrap();
        assert!(json.contains("\"recognizedText\""));
    }
}
