//! Per-key item adapters
//!
//! A helper reads its stored value once through [`StorageAdapter::get_item`]
//! and writes every later change through `set_item` / `remove_item`.

use crate::document::ReactiveDocument;
use crate::error::StorageResult;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Result of an initial read
pub enum ItemLoad {
    /// The value is available now (`None` if nothing is stored)
    Ready(Option<Value>),
    /// The value becomes available when the future resolves
    Deferred(BoxFuture<'static, StorageResult<Option<Value>>>),
}

impl std::fmt::Debug for ItemLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Item-level storage used by a helper
pub trait StorageAdapter: Send + Sync {
    fn get_item(&self, key: &str) -> ItemLoad;

    fn set_item(&self, key: &str, value: Value) -> StorageResult<()>;

    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Where items end up, for diagnostics
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Binds items to top-level slots of a [`ReactiveDocument`].
///
/// Reads are answered immediately once the document is hydrated and
/// deferred until hydration otherwise.
#[derive(Debug, Clone)]
pub struct DocumentAdapter {
    document: Arc<ReactiveDocument>,
}

impl DocumentAdapter {
    pub fn new(document: Arc<ReactiveDocument>) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Arc<ReactiveDocument> {
        &self.document
    }
}

impl StorageAdapter for DocumentAdapter {
    fn get_item(&self, key: &str) -> ItemLoad {
        if self.document.is_hydrated() {
            return ItemLoad::Ready(self.document.get(key));
        }

        let document = Arc::clone(&self.document);
        let key = key.to_string();
        ItemLoad::Deferred(Box::pin(async move {
            document.when_hydrated().await;
            Ok(document.get(&key))
        }))
    }

    fn set_item(&self, key: &str, value: Value) -> StorageResult<()> {
        self.document.insert(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.document.remove(key);
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(self.document.path())
    }
}

/// Synchronous, non-persistent adapter
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    items: RwLock<HashMap<String, Value>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an item
    pub fn with_item(self, key: impl Into<String>, value: Value) -> Self {
        self.items.write().insert(key.into(), value);
        self
    }

    pub fn item(&self, key: &str) -> Option<Value> {
        self.items.read().get(key).cloned()
    }
}

impl StorageAdapter for MemoryAdapter {
    fn get_item(&self, key: &str) -> ItemLoad {
        ItemLoad::Ready(self.item(key))
    }

    fn set_item(&self, key: &str, value: Value) -> StorageResult<()> {
        self.items.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.items.write().remove(key);
        Ok(())
    }
}
