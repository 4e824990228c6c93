//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read by the binary, never during
//! evaluation.

use crate::constants::DEFAULT_TAG_NAMESPACE;
use crate::matching_config::MatchingConfig;
use crate::store::{FileTagStore, StoreKey};
use crate::validation::validate_key_segment;
use crate::{MatchingError, MatchingResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    matching_config_path: PathBuf,
    tag_store_dir: Option<PathBuf>,
    tag_namespace: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `MatchingError::InvalidInput` if the namespace is not a valid store key
    /// segment or the store directory is set but is not a directory.
    pub fn new(
        matching_config_path: PathBuf,
        tag_store_dir: Option<PathBuf>,
        tag_namespace: String,
    ) -> MatchingResult<Self> {
        validate_key_segment("tag namespace", &tag_namespace)?;

        if let Some(dir) = &tag_store_dir {
            if !dir.is_dir() {
                return Err(MatchingError::InvalidInput(format!(
                    "tag store directory {} is not a directory",
                    dir.display()
                )));
            }
        }

        Ok(Self {
            matching_config_path,
            tag_store_dir,
            tag_namespace,
        })
    }

    pub fn matching_config_path(&self) -> &Path {
        &self.matching_config_path
    }

    pub fn tag_store_dir(&self) -> Option<&Path> {
        self.tag_store_dir.as_deref()
    }

    pub fn tag_namespace(&self) -> &str {
        &self.tag_namespace
    }

    /// Load and validate the matching configuration document.
    pub fn load_matching_config(&self) -> MatchingResult<MatchingConfig> {
        MatchingConfig::from_path(&self.matching_config_path)
    }

    /// Open the file-backed tag store, if a store directory is configured.
    pub fn open_tag_store(&self) -> MatchingResult<Option<FileTagStore>> {
        self.tag_store_dir
            .as_ref()
            .map(FileTagStore::new)
            .transpose()
    }

    /// Build a store key in the configured namespace.
    pub fn store_key(&self, key: &str) -> MatchingResult<StoreKey> {
        StoreKey::new(&self.tag_namespace, key)
    }
}

/// Parse the tag namespace from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default namespace.
pub fn tag_namespace_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_TAG_NAMESPACE.to_string())
}
