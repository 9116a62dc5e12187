//! Storage manager
//!
//! Two-phase lifecycle for one scope: [`StorageManager::construct`] builds
//! the document and factory synchronously, [`StorageManager::initialize`]
//! hydrates the document. Consumers get the manager by reference (usually a
//! [`SharedStorageManager`]) and may create helpers before initialization
//! finishes; those helpers read defaults until hydration completes.

use crate::backend::{FsBackend, StorageBackend};
use crate::config::StorageConfig;
use crate::document::ReactiveDocument;
use crate::factory::StorageFactory;
use crate::helper::StorageHelper;
use crate::scope::StorageScope;
use crate::value::StorageValue;
use std::path::Path;
use std::sync::Arc;

/// Shared storage manager
pub type SharedStorageManager = Arc<StorageManager>;

/// Owns the document and helper factory of one scope
#[derive(Debug)]
pub struct StorageManager {
    config: StorageConfig,
    scope: StorageScope,
    factory: StorageFactory,
}

impl StorageManager {
    /// Build a manager persisting to `{config.local_storage_dir}/{scope}.json`
    pub fn construct(config: StorageConfig, scope: StorageScope) -> Self {
        let backend = Arc::new(FsBackend::new(config.pretty));
        Self::with_backend(config, scope, backend)
    }

    /// Build a manager over a custom backend
    pub fn with_backend(
        config: StorageConfig,
        scope: StorageScope,
        backend: Arc<dyn StorageBackend>,
    ) -> Self {
        let document = Arc::new(ReactiveDocument::for_scope(&scope, &config, backend));
        tracing::debug!(scope = %scope, path = %document.path().display(), "Storage manager constructed");

        Self {
            config,
            scope,
            factory: StorageFactory::new(document),
        }
    }

    /// Wrap in an `Arc` for sharing
    pub fn shared(self) -> SharedStorageManager {
        Arc::new(self)
    }

    /// Hydrate the document from disk and start persisting changes
    pub async fn initialize(&self) {
        self.factory.document().initialize().await;
    }

    /// Typed helper for `key`; see [`StorageFactory::create_storage`]
    pub fn create_storage<T: StorageValue>(
        &self,
        key: impl Into<String>,
        default_value: T,
    ) -> Arc<StorageHelper<T>> {
        self.factory.create_storage(key, default_value)
    }

    /// Write pending changes now
    pub async fn flush(&self) {
        self.factory.document().flush().await;
    }

    pub fn document(&self) -> &Arc<ReactiveDocument> {
        self.factory.document()
    }

    pub fn factory(&self) -> &StorageFactory {
        &self.factory
    }

    pub fn scope(&self) -> &StorageScope {
        &self.scope
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        self.factory.document().path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let config = StorageConfig::new(dir.path()).with_debounce(Duration::from_millis(10));
        let scope = StorageScope::cluster("minikube").unwrap();

        let manager = StorageManager::construct(config.clone(), scope.clone()).shared();
        manager.initialize().await;
        manager.create_storage("sidebar_width", 200_u32).set(340);
        manager.flush().await;

        assert_eq!(manager.path(), dir.path().join("minikube.json"));
        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(manager.path()).unwrap()).unwrap();
        assert_eq!(on_disk, json!({"sidebar_width": 340}));

        let reopened = StorageManager::construct(config, scope);
        reopened.initialize().await;
        assert_eq!(reopened.create_storage("sidebar_width", 200_u32).get(), 340);
    }

    #[tokio::test]
    async fn test_helpers_created_before_initialize_hydrate() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("app.json"), r#"{"theme": "dark"}"#).unwrap();

        let manager = StorageManager::construct(StorageConfig::new(dir.path()), StorageScope::Global);
        let theme = manager.create_storage("theme", String::from("light"));
        assert_eq!(theme.get(), "light");

        manager.initialize().await;
        theme.when_ready().await;
        assert_eq!(theme.get(), "dark");
    }

    #[tokio::test]
    async fn test_invalid_json_yields_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("app.json"), "{ definitely not json").unwrap();

        let manager = StorageManager::construct(StorageConfig::new(dir.path()), StorageScope::Global);
        manager.initialize().await;

        assert_eq!(manager.create_storage("theme", String::from("light")).get(), "light");
        assert_eq!(manager.document().snapshot(), json!({}));
    }
}
