//! Sidebar geometry and expanded sections

use crate::helper::StorageHelper;
use crate::manager::StorageManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SIDEBAR_KEY: &str = "sidebar";

pub const DEFAULT_SIDEBAR_WIDTH: u32 = 200;
pub const MIN_SIDEBAR_WIDTH: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarState {
    pub width: u32,
    /// Only expanded items are kept
    pub expanded: BTreeMap<String, bool>,
}

impl Default for SidebarState {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIDEBAR_WIDTH,
            expanded: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SidebarStore {
    storage: Arc<StorageHelper<SidebarState>>,
}

impl SidebarStore {
    pub fn new(manager: &StorageManager) -> Self {
        Self {
            storage: manager.create_storage(SIDEBAR_KEY, SidebarState::default()),
        }
    }

    pub fn width(&self) -> u32 {
        self.storage.get().width
    }

    /// Set the width, never below [`MIN_SIDEBAR_WIDTH`]
    pub fn set_width(&self, width: u32) {
        let width = width.max(MIN_SIDEBAR_WIDTH);
        self.storage.merge_with(|draft| {
            draft.width = width;
            None
        });
    }

    pub fn is_expanded(&self, item_id: &str) -> bool {
        self.storage.get().expanded.get(item_id).copied().unwrap_or(false)
    }

    pub fn set_expanded(&self, item_id: &str, expanded: bool) {
        self.storage.merge_with(|draft| {
            if expanded {
                draft.expanded.insert(item_id.to_string(), true);
            } else {
                draft.expanded.remove(item_id);
            }
            None
        });
    }

    pub fn toggle_expanded(&self, item_id: &str) {
        self.set_expanded(item_id, !self.is_expanded(item_id));
    }

    pub fn collapse_all(&self) {
        self.storage.merge_with(|draft| {
            draft.expanded.clear();
            None
        });
    }

    pub fn storage(&self) -> &Arc<StorageHelper<SidebarState>> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::stores::test_support::{PATH, manager};
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_width_is_clamped() {
        let manager = manager(&MemoryBackend::new()).await;
        let sidebar = SidebarStore::new(&manager);

        assert_eq!(sidebar.width(), DEFAULT_SIDEBAR_WIDTH);
        sidebar.set_width(10);
        assert_eq!(sidebar.width(), MIN_SIDEBAR_WIDTH);
        sidebar.set_width(480);
        assert_eq!(sidebar.width(), 480);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_and_persist() {
        let backend = MemoryBackend::new();
        let manager = manager(&backend).await;
        let sidebar = SidebarStore::new(&manager);

        sidebar.toggle_expanded("workloads");
        sidebar.toggle_expanded("network");
        sidebar.toggle_expanded("network");
        assert!(sidebar.is_expanded("workloads"));
        assert!(!sidebar.is_expanded("network"));

        manager.flush().await;
        assert_eq!(
            backend.contents(PATH),
            Some(json!({"sidebar": {"width": 200, "expanded": {"workloads": true}}}))
        );

        sidebar.collapse_all();
        manager.flush().await;
        assert_eq!(backend.contents(PATH), Some(json!({})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_stored_state_keeps_defaults() {
        let backend = MemoryBackend::new().with_file(PATH, json!({"sidebar": {"width": 260}}));
        let manager = manager(&backend).await;
        let sidebar = SidebarStore::new(&manager);

        assert_eq!(sidebar.width(), 260);
        assert!(!sidebar.is_expanded("workloads"));
    }
}
