//! Storage factory
//!
//! Binds keys of one document to typed helpers. Helpers are cached, one per
//! key, so every consumer of a key shares the same value, listeners and
//! write path. Keeping keys unique within a scope is up to the callers.

use crate::document::ReactiveDocument;
use crate::helper::{DocumentAdapter, StorageAdapter, StorageHelper};
use crate::value::StorageValue;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

type CachedHelper = Arc<dyn Any + Send + Sync>;

/// Creates and caches storage helpers for one document
pub struct StorageFactory {
    document: Arc<ReactiveDocument>,
    adapter: Arc<dyn StorageAdapter>,
    helpers: Mutex<HashMap<String, CachedHelper>>,
}

impl StorageFactory {
    pub fn new(document: Arc<ReactiveDocument>) -> Self {
        let adapter: Arc<dyn StorageAdapter> = Arc::new(DocumentAdapter::new(Arc::clone(&document)));
        Self {
            document,
            adapter,
            helpers: Mutex::new(HashMap::new()),
        }
    }

    /// Helper for `key`, created on first request.
    ///
    /// Later requests for the same key and type return the cached helper and
    /// ignore `default_value`. A request for the same key with a different
    /// type gets a new, uncached helper aliasing the same slot.
    pub fn create_storage<T: StorageValue>(
        &self,
        key: impl Into<String>,
        default_value: T,
    ) -> Arc<StorageHelper<T>> {
        let key = key.into();
        let mut helpers = self.helpers.lock();

        if let Some(cached) = helpers.get(&key) {
            match Arc::clone(cached).downcast::<StorageHelper<T>>() {
                Ok(helper) => {
                    if !helper.is_default_value(&default_value) {
                        tracing::debug!(key = %key, "Cached helper keeps its original default");
                    }
                    return helper;
                }
                Err(_) => {
                    tracing::warn!(
                        key = %key,
                        "Key already bound with a different type; creating an aliasing helper"
                    );
                    return StorageHelper::new(key, default_value, Arc::clone(&self.adapter));
                }
            }
        }

        let helper = StorageHelper::new(key.clone(), default_value, Arc::clone(&self.adapter));
        helpers.insert(key, Arc::clone(&helper) as CachedHelper);
        helper
    }

    pub fn document(&self) -> &Arc<ReactiveDocument> {
        &self.document
    }

    /// Keys with a cached helper
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.helpers.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for StorageFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageFactory")
            .field("document", &self.document)
            .field("helpers", &self.helpers.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;
    use std::time::Duration;

    const PATH: &str = "/s/app.json";

    async fn hydrated_factory(backend: &MemoryBackend) -> StorageFactory {
        let document = Arc::new(ReactiveDocument::new(
            PATH,
            Arc::new(backend.clone()),
            Duration::from_millis(250),
        ));
        document.initialize().await;
        StorageFactory::new(document)
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_returns_cached_helper() {
        let factory = hydrated_factory(&MemoryBackend::new()).await;

        let a = factory.create_storage("width", 200_u32);
        let b = factory.create_storage("width", 999_u32);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b.default_value(), 200);
        assert_eq!(factory.keys(), vec!["width".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_type_aliases_slot() {
        let factory = hydrated_factory(&MemoryBackend::new()).await;

        let number = factory.create_storage("slot", 1_i64);
        number.set(5);

        let text = factory.create_storage("slot", String::from("none"));
        assert_eq!(text.get(), "none");

        let raw = factory.create_storage("slot", serde_json::Value::Null);
        assert_eq!(raw.get(), json!(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_works_for_any_json_default() {
        let backend = MemoryBackend::new();
        let factory = hydrated_factory(&backend).await;

        let flag = factory.create_storage("flag", false);
        let list = factory.create_storage("list", Vec::<String>::new());
        let object = factory.create_storage("object", json!({"a": 1}));

        flag.set(true);
        list.set(vec!["x".to_string()]);
        object.merge(json!({"b": 2}));

        factory.document().flush().await;
        assert_eq!(
            backend.contents(PATH),
            Some(json!({"flag": true, "list": ["x"], "object": {"a": 1, "b": 2}}))
        );
    }
}
