//! Typed consumer stores
//!
//! Each store holds one storage helper for its setting and exposes
//! domain operations on top of it. Stores receive the manager by reference
//! at construction and never touch the document directly.

mod dock;
mod namespaces;
mod sidebar;
mod table;

pub use dock::{DOCK_KEY, DockState, DockStore, DockTab, TabKind};
pub use namespaces::{NamespaceSelectionStore, SELECTED_NAMESPACES_KEY};
pub use sidebar::{SIDEBAR_KEY, SidebarState, SidebarStore};
pub use table::{SortOrder, TABLE_SETTINGS_KEY, TableSettings, TableSettingsStore, TableSortParams};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::backend::MemoryBackend;
    use crate::config::StorageConfig;
    use crate::manager::StorageManager;
    use crate::scope::StorageScope;
    use std::sync::Arc;

    pub(crate) const DIR: &str = "/prefs";
    pub(crate) const PATH: &str = "/prefs/app.json";

    /// Hydrated manager over an in-memory backend
    pub(crate) async fn manager(backend: &MemoryBackend) -> StorageManager {
        let manager = StorageManager::with_backend(
            StorageConfig::new(DIR),
            StorageScope::Global,
            Arc::new(backend.clone()),
        );
        manager.initialize().await;
        manager
    }
}
