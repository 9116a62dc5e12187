//! Storage scopes
//!
//! Each scope owns exactly one JSON file: `{local_storage_dir}/{scope_id}.json`.

use crate::error::{StorageError, StorageResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Scope id used for application-wide settings
pub const GLOBAL_SCOPE_ID: &str = "app";

/// Identity under which one document is persisted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Application-wide settings
    Global,
    /// Settings of a single cluster, keyed by its identifier
    Cluster(String),
}

impl StorageScope {
    /// Build a cluster scope, rejecting ids that would escape the storage
    /// directory or produce an unusable file name
    pub fn cluster(id: impl Into<String>) -> StorageResult<Self> {
        let id = id.into();
        let reason = if id.trim().is_empty() {
            Some("cluster id is empty")
        } else if id == "." || id == ".." {
            Some("cluster id is a relative path component")
        } else if id.contains(['/', '\\']) {
            Some("cluster id contains a path separator")
        } else if id.contains('\0') {
            Some("cluster id contains a NUL byte")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(StorageError::InvalidScope { id, reason }),
            None => Ok(Self::Cluster(id)),
        }
    }

    /// The opaque scope identifier
    pub fn id(&self) -> &str {
        match self {
            Self::Global => GLOBAL_SCOPE_ID,
            Self::Cluster(id) => id,
        }
    }

    /// Path of this scope's file under `dir`
    pub fn file_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!("{}.json", self.id()))
    }
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Cluster(id) => write!(f, "cluster:{}", id),
        }
    }
}
