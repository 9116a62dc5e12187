//! Core error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for prefstore operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure to read a scope file.
///
/// Every variant is treated as "no persisted state" by the document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("storage file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a JSON object in {}, found {found}", path.display())]
    NotAnObject { path: PathBuf, found: &'static str },
}

impl LoadError {
    /// Missing files are the normal first-run case and log quieter than the rest
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound { path }
            | Self::Io { path, .. }
            | Self::Malformed { path, .. }
            | Self::NotAnObject { path, .. } => path,
        }
    }
}

/// Failure to write a scope file. The write is dropped without retry.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize content for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("backend rejected write to {}: {reason}", path.display())]
    Rejected { path: PathBuf, reason: String },
}

/// Umbrella error for the storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Save(#[from] SaveError),

    /// A value could not be converted to or from JSON for a key
    #[error("value for key '{key}' could not be converted: {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage scope '{id}': {reason}")]
    InvalidScope { id: String, reason: &'static str },

    /// No async runtime was available to drive a deferred operation
    #[error("runtime unavailable: {0}")]
    Runtime(String),
}

impl StorageError {
    pub fn value(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Value {
            key: key.into(),
            source,
        }
    }
}
