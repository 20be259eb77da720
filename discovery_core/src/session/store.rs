//! Session state stores.
//!
//! A store is scoped to one browsing session. Loading never fails: a missing
//! or unreadable record means "no prior session".

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use super::SessionState;
use crate::error::StoreError;

/// Persistence for the session record.
pub trait SessionStateStore: Send + Sync {
    /// The persisted record, or a fresh one if none exists or it is corrupt.
    fn load(&self) -> SessionState;

    /// Replace the persisted record in one step.
    fn save(&self, state: &SessionState) -> Result<(), StoreError>;

    /// Forget the persisted record.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Decode a stored record, falling back to a fresh session.
fn decode(raw: &str) -> SessionState {
    match serde_json::from_str(raw) {
        Ok(state) => state,
        Err(e) => {
            log::warn!("Discarding unreadable session record: {}", e);
            SessionState::new()
        }
    }
}

/// Keeps the serialized record in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing raw record, valid or not.
    pub fn with_record(raw: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(raw.into())),
        }
    }

    /// The raw record as currently stored.
    pub fn raw(&self) -> Option<String> {
        self.record.lock().clone()
    }
}

impl SessionStateStore for MemoryStore {
    fn load(&self) -> SessionState {
        match self.record.lock().as_deref() {
            Some(raw) => decode(raw),
            None => SessionState::new(),
        }
    }

    fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state)?;
        *self.record.lock() = Some(raw);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.record.lock().take();
        Ok(())
    }
}

/// Keeps the record in a JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStateStore for FileStore {
    fn load(&self) -> SessionState {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionState::new(),
            Err(e) => {
                log::warn!("Failed to read session record {}: {}", self.path.display(), e);
                SessionState::new()
            }
        }
    }

    fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        let raw = serde_json::to_vec_pretty(state)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let staging = self.staging_path();
        std::fs::write(&staging, raw)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> SessionState {
        let mut state = SessionState::new();
        state.interaction_count = 6;
        state.discovered.unlock("/essays");
        state
    }

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.load().interaction_count, 0);
        assert!(store.raw().is_none());
    }

    #[test]
    fn test_memory_store_persists_and_clears() {
        let store = MemoryStore::new();
        let state = sample_state();
        store.save(&state).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.interaction_count, 6);
        assert_eq!(loaded.session_id, state.session_id);
        assert!(loaded.discovered.is_discovered("/essays"));

        store.clear().unwrap();
        assert_eq!(store.load().interaction_count, 0);
    }

    #[test]
    fn test_corrupt_record_is_a_fresh_session() {
        let store = MemoryStore::with_record("{ definitely not json");
        let state = store.load();
        assert_eq!(state.interaction_count, 0);
        assert!(state.discovered.is_empty());

        let store = MemoryStore::with_record(r#"{ "interaction_count": "three" }"#);
        assert_eq!(store.load().interaction_count, 0);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().interaction_count, 0);

        store.save(&sample_state()).unwrap();
        assert!(store.path().exists());
        assert!(!store.staging_path().exists());
        assert_eq!(store.load().interaction_count, 6);

        store.clear().unwrap();
        assert!(!store.path().exists());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.load().interaction_count, 0);
    }
}
