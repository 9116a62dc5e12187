//! Backing store trait definition

use crate::error::{LoadError, SaveError};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// Reads and writes whole scope files.
///
/// `load` returns whatever JSON the file holds; callers decide whether a
/// non-object is acceptable. `save` replaces the file content.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read and parse the file at `path`
    async fn load(&self, path: &Path) -> Result<Value, LoadError>;

    /// Replace the file at `path` with `content`
    async fn save(&self, path: &Path, content: &Value) -> Result<(), SaveError>;
}
