use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Key under which the newest-first list of past reports is stored.
pub const REPORT_HISTORY_KEY: &str = "interview_history";
/// Key under which today's attempt counter is stored.
pub const DAILY_ATTEMPTS_KEY: &str = "daily_attempts";

/// String key-value persistence so the controller never depends on a storage technology.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

/// Read a JSON value, treating missing, unreadable, and malformed entries alike as absent.
pub fn load_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "stored value unreadable; treating as absent");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "stored value corrupt; treating as absent");
            None
        }
    }
}

pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, encoded)
}

/// Process-local store used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Single JSON document on disk holding every key. Writes rewrite the whole file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`. A corrupt file starts the store empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "store file corrupt; starting empty");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(StorageError::Io(err)),
        };

        debug!(path = %path.display(), keys = entries.len(), "opened json store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let encoded =
            serde_json::to_string_pretty(entries).map_err(|source| StorageError::Encode {
                key: self.path.display().to_string(),
                source,
            })?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("file store poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("file store poisoned".to_string()))?;
        let mut staged = entries.clone();
        staged.insert(key.to_string(), value);
        self.flush(&staged)?;
        *entries = staged;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("file store poisoned".to_string()))?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut staged = entries.clone();
        staged.remove(key);
        self.flush(&staged)?;
        *entries = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::interview::domain::DailyAttempts;
    use chrono::NaiveDate;

    #[test]
    fn corrupt_json_is_treated_as_absent() {
        let store = MemoryStore::new();
        store
            .set(DAILY_ATTEMPTS_KEY, "{not json".to_string())
            .expect("set succeeds");

        let loaded: Option<DailyAttempts> = load_json(&store, DAILY_ATTEMPTS_KEY);
        assert!(loaded.is_none());
    }

    #[test]
    fn wrong_shape_is_treated_as_absent() {
        let store = MemoryStore::new();
        store
            .set(DAILY_ATTEMPTS_KEY, "[1, 2, 3]".to_string())
            .expect("set succeeds");

        let loaded: Option<DailyAttempts> = load_json(&store, DAILY_ATTEMPTS_KEY);
        assert!(loaded.is_none());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("store.json");
        let attempts = DailyAttempts {
            count: 2,
            date: NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
        };

        {
            let store = JsonFileStore::open(&path).expect("open store");
            save_json(&store, DAILY_ATTEMPTS_KEY, &attempts).expect("save");
        }

        let reopened = JsonFileStore::open(&path).expect("reopen store");
        let loaded: Option<DailyAttempts> = load_json(&reopened, DAILY_ATTEMPTS_KEY);
        assert_eq!(loaded, Some(attempts));
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        fs::write(&path, "this is not a json document").expect("write garbage");

        let store = JsonFileStore::open(&path).expect("open tolerates corruption");
        assert_eq!(store.get(REPORT_HISTORY_KEY).expect("get"), None);

        store
            .set(REPORT_HISTORY_KEY, "[]".to_string())
            .expect("set overwrites corrupt file");
        let raw = fs::read_to_string(&path).expect("read back");
        assert!(raw.contains(REPORT_HISTORY_KEY));
    }

    #[test]
    fn failed_write_leaves_entries_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        let store = JsonFileStore::open(&path).expect("open store");
        store.set("kept", "1".to_string()).expect("first write");

        fs::create_dir(path.with_extension("json.tmp")).expect("block staging file");

        assert!(store.set("lost", "2".to_string()).is_err());
        assert_eq!(store.get("lost").expect("get"), None);
        assert!(store.remove("kept").is_err());
        assert_eq!(store.get("kept").expect("get"), Some("1".to_string()));

        let reopened = JsonFileStore::open(&path).expect("reopen");
        assert_eq!(reopened.get("kept").expect("get"), Some("1".to_string()));
        assert_eq!(reopened.get("lost").expect("get"), None);
    }

    #[test]
    fn remove_is_a_noop_for_missing_keys() {
        let store = MemoryStore::new();
        store.remove("missing").expect("remove missing key");
        store.set("present", "1".to_string()).expect("set");
        store.remove("present").expect("remove present key");
        assert!(store.keys().is_empty());
    }
}
