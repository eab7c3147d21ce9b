//! Persisted key-value store.
//!
//! Every feature reads and writes through the [`KeyValueStore`] port. Values
//! are JSON text under well-known string keys (see [`keys`]). The on-disk
//! implementation keeps the whole map in one JSON document and protects it
//! with file locking and atomic replacement.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Well-known store keys shared by all features
pub mod keys {
    pub const ONBOARDING: &str = "cal.onboarding.v1";
    pub const PROFILE: &str = "cal.profile.v1";
    pub const PROGRAM_META: &str = "program_meta";
    pub const PROGRAM_DAYS: &str = "program_days";
    pub const PROGRAM_SETS: &str = "program_sets";
    pub const COURSE_PROGRESS: &str = "progress";
    pub const TIMER_REMAINING: &str = "timer_rem";
    pub const TIMER_RUNNING: &str = "timer_running";
    pub const OPEN_LOG_INTENT: &str = "open_log_intent";
    pub const CALORIE_PROFILE: &str = "calorie_profile";

    /// `log_<YYYY-MM-DD>_<day>_<index>`
    pub fn dated_log(date_key: &str, day: u8, index: usize) -> String {
        format!("log_{}_{}_{}", date_key, day, index)
    }

    /// `log_<day>_<index>`, the undated format kept for old data
    pub fn legacy_log(day: u8, index: usize) -> String {
        format!("log_{}_{}", day, index)
    }

    pub fn variants(day: u8) -> String {
        format!("variants_{}", day)
    }

    pub fn variants_by_index(day: u8) -> String {
        format!("variants_{}_byIndex", day)
    }
}

/// Synchronous string-keyed store of JSON text values
pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Typed access on top of any [`KeyValueStore`]
pub trait StoreExt: KeyValueStore {
    /// Read and parse a JSON value.
    ///
    /// Malformed values are logged and treated as absent.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring malformed value under '{}': {}", key, e);
                None
            }
        }
    }

    fn set_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, raw)
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}

// ============================================================================
// In-memory store
// ============================================================================

/// Store kept entirely in memory (tests, dry runs)
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// Store persisted as a single JSON object on disk.
///
/// The document is read on open. Each mutation holds an exclusive lock on
/// `<store>.lock`, re-reads the document, applies its one key and rewrites
/// the file atomically, so writers touching different keys never drop each
/// other's entries.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path` with a shared lock for reading.
    ///
    /// A missing file yields an empty store. A corrupted file is logged and
    /// also yields an empty store; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = Self::read_entries(&path)?;
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Apply `change` to the latest on-disk document under the writer lock.
    ///
    /// `change` returns whether anything changed; nothing is written otherwise.
    fn update<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Store(format!("store path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;

        let result = Self::read_entries(&self.path).and_then(|mut entries| {
            let changed = change(&mut entries);
            self.entries = entries;
            if changed {
                self.flush()
            } else {
                Ok(())
            }
        });

        lock.unlock()?;
        result
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            tracing::info!("No store file at {:?}, starting empty", path);
            return Ok(BTreeMap::new());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
            Ok(entries) => {
                tracing::debug!("Loaded {} store entries from {:?}", entries.len(), path);
                Ok(entries)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse store file {:?}: {}. Starting empty.",
                    path,
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }

    /// Write the whole document through a locked temp file and rename it
    /// over the original.
    fn flush(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Store(format!("store path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(&self.entries)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Flushed {} store entries to {:?}", self.entries.len(), self.path);
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value);
            true
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        level: String,
        count: u32,
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store
            .set_json(
                "sample",
                &Sample {
                    level: "beginner".into(),
                    count: 3,
                },
            )
            .unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        let loaded: Sample = reopened.get_json("sample").unwrap();
        assert_eq!(loaded.level, "beginner");
        assert_eq!(loaded.count, 3);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(temp_dir.path().join("nope.json")).unwrap();
        assert!(store.get_raw("anything").is_none());
    }

    #[test]
    fn test_corrupted_file_starts_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(store.get_raw("progress").is_none());

        store.set_raw("progress", r#"{"done":[1]}"#.into()).unwrap();
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_raw("progress").unwrap(), r#"{"done":[1]}"#);
    }

    #[test]
    fn test_malformed_value_reads_as_absent() {
        let mut store = MemoryStore::new();
        store.set_raw("program_days", "not json".into()).unwrap();
        let parsed: Option<Vec<String>> = store.get_json("program_days");
        assert!(parsed.is_none());
    }

    #[test]
    fn test_remove_deletes_key_on_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_raw("open_log_intent", "{}".into()).unwrap();
        store.remove("open_log_intent").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert!(reopened.get_raw("open_log_intent").is_none());
    }

    #[test]
    fn test_two_handles_keep_each_others_keys() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut first = JsonFileStore::open(&path).unwrap();
        let mut second = JsonFileStore::open(&path).unwrap();
        first
            .set_raw("log_2025-06-02_1_0", r#"[{"kg":"50","reps":"10"}]"#.into())
            .unwrap();
        second.set_raw("timer_rem", "120".into()).unwrap();
        second.remove("open_log_intent").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert!(reopened.get_raw("log_2025-06-02_1_0").is_some());
        assert_eq!(reopened.get_raw("timer_rem").unwrap(), "120");
        // The writer also sees what the other handle wrote
        assert!(second.get_raw("log_2025-06-02_1_0").is_some());
    }

    #[test]
    fn test_no_stray_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_raw("timer_rem", "120".into()).unwrap();
        store.set_raw("timer_running", "1".into()).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "store.json" && e.file_name() != "store.json.lock")
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
    }
}
