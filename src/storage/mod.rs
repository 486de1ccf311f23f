use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::models::state::TrackerState;
use crate::utils::dates;

pub mod migrations;

/// Fixed key the whole tracker state lives under. Matches the key the
/// browser build used, so existing blobs load unmodified.
pub const STATE_KEY: &str = "macroTrackerState";

/// Minimal persistence contract: an opaque byte blob per key, full
/// overwrite on every write.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;
    fn put(&self, key: &str, bytes: &[u8]) -> AppResult<()>;
}

/// Blob store backed by one file per key inside a data directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> AppResult<Self> {
        let dir = dir.into();
        info!(target: "app::storage", dir = %dir.display(), "initializing file store");
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.blob_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.blob_path(key);
        fs::write(&path, bytes)?;
        debug!(target: "app::storage", %key, bytes = bytes.len(), "blob written");
        Ok(())
    }
}

/// Loads and migrates the persisted state. An absent or malformed blob is
/// treated as absent state, never a fatal error.
pub fn load_state(store: &dyn BlobStore) -> AppResult<TrackerState> {
    let Some(bytes) = store.get(STATE_KEY)? else {
        info!(target: "app::storage", "no persisted state, starting fresh");
        return Ok(TrackerState::default());
    };

    let mut raw: JsonValue = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => {
            warn!(target: "app::storage", error = %err, "persisted state is not valid JSON, discarding");
            return Ok(TrackerState::default());
        }
    };

    migrations::run(&mut raw, &dates::today_string());

    match serde_json::from_value(raw) {
        Ok(state) => Ok(state),
        Err(err) => {
            warn!(target: "app::storage", error = %err, "persisted state has an unusable shape, discarding");
            Ok(TrackerState::default())
        }
    }
}

/// Serializes and writes the full state back under the fixed key.
pub fn save_state(store: &dyn BlobStore, state: &TrackerState) -> AppResult<()> {
    let bytes = serde_json::to_vec(state)?;
    store.put(STATE_KEY, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("data")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn missing_blob_reads_as_none() {
        let (store, _guard) = setup_store();
        assert!(store.get(STATE_KEY).unwrap().is_none());
    }

    #[test]
    fn state_round_trips_through_the_store() {
        let (store, _guard) = setup_store();

        let mut state = TrackerState::default();
        state.selected_date = "2026-02-25".to_string();
        state.history.entry("2026-02-25".to_string()).or_default();
        save_state(&store, &state).unwrap();

        let loaded = load_state(&store).unwrap();
        assert_eq!(loaded.selected_date, state.selected_date);
        assert_eq!(loaded.history.len(), 1);
    }

    #[test]
    fn malformed_blob_is_treated_as_absent_state() {
        let (store, _guard) = setup_store();
        store.put(STATE_KEY, b"{not json at all").unwrap();

        let loaded = load_state(&store).unwrap();
        assert_eq!(loaded, TrackerState::default());
    }

    #[test]
    fn non_object_blob_is_treated_as_absent_state() {
        let (store, _guard) = setup_store();
        store.put(STATE_KEY, b"[1,2,3]").unwrap();

        let loaded = load_state(&store).unwrap();
        assert_eq!(loaded, TrackerState::default());
    }
}
