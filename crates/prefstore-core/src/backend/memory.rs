//! In-memory backend
//!
//! Keeps scope "files" in a shared map. Cloning the backend shares the map,
//! so a test can hand one clone to a document and inspect the other.

use super::r#trait::StorageBackend;
use crate::error::{LoadError, SaveError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryInner {
    files: Mutex<HashMap<PathBuf, Value>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    load_delay: Mutex<Option<Duration>>,
}

/// Backend holding file contents in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file with content
    pub fn with_file(self, path: impl Into<PathBuf>, content: Value) -> Self {
        self.inner.files.lock().insert(path.into(), content);
        self
    }

    /// Delay every `load` by `delay`, simulating slow storage
    pub fn with_load_delay(self, delay: Duration) -> Self {
        *self.inner.load_delay.lock() = Some(delay);
        self
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn fail_saves(&self, fail: bool) {
        self.inner.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Current content of a file
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Value> {
        self.inner.files.lock().get(path.as_ref()).cloned()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn load(&self, path: &Path) -> Result<Value, LoadError> {
        let delay = *self.inner.load_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.contents(path).ok_or_else(|| LoadError::NotFound {
            path: path.to_path_buf(),
        })
    }

    async fn save(&self, path: &Path, content: &Value) -> Result<(), SaveError> {
        if self.inner.fail_saves.load(Ordering::SeqCst) {
            return Err(SaveError::Rejected {
                path: path.to_path_buf(),
                reason: "memory backend configured to fail".to_string(),
            });
        }

        self.inner
            .files
            .lock()
            .insert(path.to_path_buf(), content.clone());
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_seeded_file_loads() {
        let backend = MemoryBackend::new().with_file("app.json", json!({"k": 1}));
        let loaded = backend.load(Path::new("app.json")).await.unwrap();
        assert_eq!(loaded, json!({"k": 1}));
    }

    #[tokio::test]
    async fn test_clones_share_files() {
        let backend = MemoryBackend::new();
        let observer = backend.clone();

        backend
            .save(Path::new("c1.json"), &json!({"dock": {}}))
            .await
            .unwrap();

        assert_eq!(observer.contents("c1.json"), Some(json!({"dock": {}})));
        assert_eq!(observer.save_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_saves() {
        let backend = MemoryBackend::new();
        backend.fail_saves(true);

        let err = backend
            .save(Path::new("app.json"), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::Rejected { .. }));
        assert_eq!(backend.save_count(), 0);
        assert!(backend.contents("app.json").is_none());
    }
}
