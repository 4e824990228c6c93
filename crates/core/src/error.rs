use std::path::PathBuf;

/// Errors raised by configuration loading and tag persistence.
///
/// The evaluators themselves (`extract_tags`, `find_matching_diagnostic_rule`,
/// `find_matching_plans`) are total and never return this type.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid matching configuration: {0}")]
    InvalidConfig(String),
    #[error("matching configuration schema mismatch at {path}: {message}")]
    ConfigSchema { path: String, message: String },
    #[error(
        "unsupported matching configuration format (path: {path}); expected .yaml, .yml or .json",
        path = path.display()
    )]
    UnsupportedConfigFormat { path: PathBuf },
    #[error("invalid tag store root: {0}")]
    InvalidStoreRoot(String),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to create directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to remove file: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize JSON: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize JSON: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("tag store lock poisoned")]
    StoreLockPoisoned,
}

pub type MatchingResult<T> = std::result::Result<T, MatchingError>;
