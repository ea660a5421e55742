//! Persisted reading history: what kind of book a document is and how far the
//! reader got, keyed by document identifier (local path or chapter URL).
//!
//! The on-disk value is either a structured record or, from older versions, a
//! bare integer offset. The bare form decodes as a local book at that offset.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, StoreError};

/// How to reconstruct a parser for a persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookKind {
    Local,
    Online,
}

/// Snapshot of a document's reading position.
///
/// Invariant: `section_path` is set iff `kind == Online`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistHistory {
    pub kind: BookKind,
    /// Byte offset for local books; in-chapter character offset for online.
    pub read_offset: u64,
    /// URL of the last-visited chapter (online books only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_path: Option<String>,
}

impl PersistHistory {
    pub fn local(read_offset: u64) -> Self {
        Self {
            kind: BookKind::Local,
            read_offset,
            section_path: None,
        }
    }

    pub fn online(section_path: String, read_offset: u64) -> Self {
        Self {
            kind: BookKind::Online,
            read_offset,
            section_path: Some(section_path),
        }
    }
}

/// The stored form as found on disk. Decoded leniently: the record's kind is a
/// raw string so an unknown kind surfaces as `UnsupportedKind` at load time
/// instead of a serde error, and the legacy bare-integer form is accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredHistory {
    Legacy(u64),
    Record(RawHistory),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHistory {
    pub kind: String,
    #[serde(default)]
    pub read_offset: u64,
    #[serde(default)]
    pub section_path: Option<String>,
}

impl StoredHistory {
    /// Validate the stored form into a usable history record.
    pub fn resolve(self) -> Result<PersistHistory, LoadError> {
        match self {
            StoredHistory::Legacy(read_offset) => Ok(PersistHistory::local(read_offset)),
            StoredHistory::Record(raw) => match raw.kind.as_str() {
                "local" => Ok(PersistHistory::local(raw.read_offset)),
                "online" => Ok(PersistHistory {
                    kind: BookKind::Online,
                    read_offset: raw.read_offset,
                    section_path: raw.section_path,
                }),
                other => Err(LoadError::UnsupportedKind(other.to_string())),
            },
        }
    }
}

/// Where reading positions live between runs. Get-with-default and upsert,
/// plus a pointer to the currently open book so navigation commands do not
/// need the path repeated.
pub trait HistoryStore {
    fn get(&self, key: &str) -> Option<StoredHistory>;
    fn upsert(&mut self, key: &str, history: &PersistHistory) -> Result<(), StoreError>;
    fn current_book(&self) -> Option<String>;
    fn set_current_book(&mut self, key: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store (tests, embedding)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    current: Option<String>,
    books: HashMap<String, serde_json::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, e.g. a legacy bare integer.
    pub fn insert_raw(&mut self, key: &str, value: serde_json::Value) {
        self.books.insert(key.to_string(), value);
    }
}

impl HistoryStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredHistory> {
        let value = self.books.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(stored) => Some(stored),
            Err(err) => {
                tracing::warn!("Ignoring malformed history for {key}: {err}");
                None
            }
        }
    }

    fn upsert(&mut self, key: &str, history: &PersistHistory) -> Result<(), StoreError> {
        let value = serde_json::to_value(history)?;
        self.books.insert(key.to_string(), value);
        Ok(())
    }

    fn current_book(&self) -> Option<String> {
        self.current.clone()
    }

    fn set_current_book(&mut self, key: &str) -> Result<(), StoreError> {
        self.current = Some(key.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    current: Option<String>,
    #[serde(default)]
    books: HashMap<String, serde_json::Value>,
}

/// File-backed store: one JSON document holding every book's history plus the
/// current-book pointer. Written whole on every upsert.
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    state: StoreFile,
}

impl JsonHistoryStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreFile::default(),
            Err(err) => return Err(StoreError::Io(err)),
        };
        Ok(Self { path, state })
    }

    /// Default store location (`~/.local/share/turnpage/history.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|mut p| {
            p.push("turnpage");
            p.push("history.json");
            p
        })
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
        }
        let content = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.path, content).map_err(StoreError::Io)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn get(&self, key: &str) -> Option<StoredHistory> {
        let value = self.state.books.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(stored) => Some(stored),
            Err(err) => {
                tracing::warn!("Ignoring malformed history for {key}: {err}");
                None
            }
        }
    }

    fn upsert(&mut self, key: &str, history: &PersistHistory) -> Result<(), StoreError> {
        let value = serde_json::to_value(history)?;
        self.state.books.insert(key.to_string(), value);
        self.save()
    }

    fn current_book(&self) -> Option<String> {
        self.state.current.clone()
    }

    fn set_current_book(&mut self, key: &str) -> Result<(), StoreError> {
        self.state.current = Some(key.to_string());
        self.save()
    }
}
