//! Constants used throughout the anamnese core crate.

/// Namespace applied to tag store keys when none is configured.
pub const DEFAULT_TAG_NAMESPACE: &str = "anamnese";

/// Default key under which a patient's applied tags are stored.
pub const DEFAULT_TAG_KEY: &str = "applied_tags";

/// Separator used when rendering a namespaced store key.
pub const STORE_KEY_SEPARATOR: char = ':';

/// Maximum length of a single store key segment (namespace or key).
pub const MAX_KEY_SEGMENT_LEN: usize = 128;

/// File extension for tag records written by the file-backed store.
pub const TAG_RECORD_EXTENSION: &str = "json";

/// Environment variable naming the matching configuration document.
pub const ENV_MATCHING_CONFIG: &str = "ANAMNESE_CONFIG";

/// Environment variable naming the directory used by the file-backed tag store.
pub const ENV_TAG_STORE_DIR: &str = "ANAMNESE_STORE_DIR";

/// Environment variable overriding the tag store namespace.
pub const ENV_TAG_NAMESPACE: &str = "ANAMNESE_TAG_NAMESPACE";
