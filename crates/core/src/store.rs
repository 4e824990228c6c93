//! Tag persistence.
//!
//! Applied tag sets are saved between sessions under a namespaced key. Storage is an
//! injected capability ([`TagStore`]) rather than a global, so the evaluators stay free of
//! I/O and callers choose the backend:
//!
//! - [`InMemoryTagStore`] for tests and short-lived processes
//! - [`FileTagStore`] for a directory of JSON records
//!
//! ```text
//! <root>/
//! └── <namespace>/
//!     └── <key>.json    # { "tags": [...], "saved_at": "..." }
//! ```

use crate::constants::{DEFAULT_TAG_NAMESPACE, STORE_KEY_SEPARATOR, TAG_RECORD_EXTENSION};
use crate::validation::validate_key_segment;
use crate::{MatchingError, MatchingResult};
use anamnese_types::Tag;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

/// A validated, namespaced store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    namespace: String,
    key: String,
}

impl StoreKey {
    /// Create a key in the given namespace.
    ///
    /// # Errors
    ///
    /// Returns `MatchingError::InvalidInput` if either part is empty, too long, starts with
    /// `.` or contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(namespace: &str, key: &str) -> MatchingResult<Self> {
        validate_key_segment("namespace", namespace)?;
        validate_key_segment("key", key)?;
        Ok(Self {
            namespace: namespace.to_owned(),
            key: key.to_owned(),
        })
    }

    /// Create a key in the default namespace.
    pub fn in_default_namespace(key: &str) -> MatchingResult<Self> {
        Self::new(DEFAULT_TAG_NAMESPACE, key)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.namespace, STORE_KEY_SEPARATOR, self.key)
    }
}

/// Key-value storage for applied tag lists.
pub trait TagStore {
    /// Load the tags stored under `key`, or `None` if nothing is stored.
    fn get(&self, key: &StoreKey) -> MatchingResult<Option<Vec<Tag>>>;

    /// Store `tags` under `key`, replacing any previous value.
    fn set(&self, key: &StoreKey, tags: &[Tag]) -> MatchingResult<()>;

    /// Remove the value stored under `key`. Returns `true` if a value was removed.
    fn remove(&self, key: &StoreKey) -> MatchingResult<bool>;
}

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryTagStore {
    entries: RwLock<HashMap<StoreKey, Vec<Tag>>>,
}

impl InMemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TagStore for InMemoryTagStore {
    fn get(&self, key: &StoreKey) -> MatchingResult<Option<Vec<Tag>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| MatchingError::StoreLockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &StoreKey, tags: &[Tag]) -> MatchingResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| MatchingError::StoreLockPoisoned)?;
        entries.insert(key.clone(), tags.to_vec());
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> MatchingResult<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| MatchingError::StoreLockPoisoned)?;
        Ok(entries.remove(key).is_some())
    }
}

/// A tag list as written to disk by [`FileTagStore`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagRecord {
    pub tags: Vec<Tag>,
    pub saved_at: DateTime<Utc>,
}

/// Store writing one JSON record per key beneath a root directory.
///
/// Each write goes to its own uniquely named temporary file in the namespace directory,
/// which is then renamed over the record. Readers never observe a partial record, and
/// concurrent writers to one key end with one complete record (last rename wins).
#[derive(Debug)]
pub struct FileTagStore {
    root_directory: PathBuf,
}

impl FileTagStore {
    /// Creates a store rooted at `root_directory`.
    ///
    /// # Errors
    ///
    /// Returns `MatchingError::InvalidStoreRoot` if the directory does not exist or is not a
    /// directory.
    pub fn new(root_directory: impl Into<PathBuf>) -> MatchingResult<Self> {
        let root_directory = root_directory.into();
        if !root_directory.is_dir() {
            return Err(MatchingError::InvalidStoreRoot(format!(
                "{} is not a directory",
                root_directory.display()
            )));
        }
        Ok(Self { root_directory })
    }

    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    fn namespace_dir(&self, key: &StoreKey) -> PathBuf {
        self.root_directory.join(key.namespace())
    }

    fn record_path(&self, key: &StoreKey) -> PathBuf {
        self.namespace_dir(key)
            .join(format!("{}.{}", key.key(), TAG_RECORD_EXTENSION))
    }

    /// Load the full record stored under `key`, including when it was saved.
    pub fn get_record(&self, key: &StoreKey) -> MatchingResult<Option<TagRecord>> {
        let path = self.record_path(key);
        if !path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(MatchingError::FileRead)?;
        let record: TagRecord =
            serde_json::from_str(&contents).map_err(MatchingError::Deserialization)?;
        Ok(Some(record))
    }
}

impl TagStore for FileTagStore {
    fn get(&self, key: &StoreKey) -> MatchingResult<Option<Vec<Tag>>> {
        Ok(self.get_record(key)?.map(|record| record.tags))
    }

    fn set(&self, key: &StoreKey, tags: &[Tag]) -> MatchingResult<()> {
        let dir = self.namespace_dir(key);
        fs::create_dir_all(&dir).map_err(MatchingError::DirCreation)?;

        let record = TagRecord {
            tags: tags.to_vec(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&record).map_err(MatchingError::Serialization)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(MatchingError::FileWrite)?;
        tmp.write_all(json.as_bytes()).map_err(MatchingError::FileWrite)?;
        tmp.as_file().sync_all().map_err(MatchingError::FileWrite)?;
        tmp.persist(self.record_path(key))
            .map_err(|err| MatchingError::FileWrite(err.error))?;

        tracing::debug!(key = %key, tags = tags.len(), "stored applied tags");
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> MatchingResult<bool> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(MatchingError::FileRemove(err)),
        }
    }
}
