//! Dock panel: height, open state and tabs

use crate::helper::StorageHelper;
use crate::manager::StorageManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DOCK_KEY: &str = "dock";

pub const DEFAULT_DOCK_HEIGHT: u32 = 300;
pub const MIN_DOCK_HEIGHT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TabKind {
    Terminal,
    CreateResource,
    EditResource,
    InstallChart,
    UpgradeChart,
    PodLogs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockTab {
    pub id: String,
    pub kind: TabKind,
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
}

impl DockTab {
    pub fn new(id: impl Into<String>, kind: TabKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            pinned: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockState {
    pub height: u32,
    pub is_open: bool,
    pub tabs: Vec<DockTab>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_tab_id: Option<String>,
}

impl Default for DockState {
    fn default() -> Self {
        Self {
            height: DEFAULT_DOCK_HEIGHT,
            is_open: false,
            tabs: Vec::new(),
            selected_tab_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DockStore {
    storage: Arc<StorageHelper<DockState>>,
}

impl DockStore {
    pub fn new(manager: &StorageManager) -> Self {
        Self {
            storage: manager.create_storage(DOCK_KEY, DockState::default()),
        }
    }

    pub fn state(&self) -> DockState {
        self.storage.get()
    }

    pub fn is_open(&self) -> bool {
        self.storage.get().is_open
    }

    pub fn open(&self) {
        self.storage.merge(serde_json::json!({ "isOpen": true }));
    }

    pub fn close(&self) {
        self.storage.merge(serde_json::json!({ "isOpen": false }));
    }

    pub fn toggle(&self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    /// Set the panel height, never below [`MIN_DOCK_HEIGHT`]
    pub fn set_height(&self, height: u32) {
        let height = height.max(MIN_DOCK_HEIGHT);
        self.storage.merge_with(|draft| {
            draft.height = height;
            None
        });
    }

    pub fn tabs(&self) -> Vec<DockTab> {
        self.storage.get().tabs
    }

    pub fn selected_tab(&self) -> Option<DockTab> {
        let state = self.storage.get();
        let selected = state.selected_tab_id?;
        state.tabs.into_iter().find(|tab| tab.id == selected)
    }

    /// Add a tab (or replace one with the same id), select it and open the dock
    pub fn add_tab(&self, tab: DockTab) {
        self.storage.merge_with(|draft| {
            let id = tab.id.clone();
            match draft.tabs.iter_mut().find(|existing| existing.id == id) {
                Some(existing) => *existing = tab,
                None => draft.tabs.push(tab),
            }
            draft.selected_tab_id = Some(id);
            draft.is_open = true;
            None
        });
    }

    /// Select an existing tab; unknown ids are ignored
    pub fn select_tab(&self, tab_id: &str) {
        self.storage.merge_with(|draft| {
            if draft.tabs.iter().any(|tab| tab.id == tab_id) {
                draft.selected_tab_id = Some(tab_id.to_string());
            }
            None
        });
    }

    /// Close a tab. Pinned tabs stay. Closing the selected tab selects its
    /// neighbour; closing the last tab closes the dock.
    pub fn close_tab(&self, tab_id: &str) {
        self.storage.merge_with(|draft| {
            let Some(index) = draft.tabs.iter().position(|tab| tab.id == tab_id) else {
                return None;
            };
            if draft.tabs[index].pinned {
                return None;
            }

            draft.tabs.remove(index);
            if draft.selected_tab_id.as_deref() == Some(tab_id) {
                let neighbour = index.min(draft.tabs.len().saturating_sub(1));
                draft.selected_tab_id = draft.tabs.get(neighbour).map(|tab| tab.id.clone());
            }
            if draft.tabs.is_empty() {
                draft.is_open = false;
            }
            None
        });
    }

    pub fn storage(&self) -> &Arc<StorageHelper<DockState>> {
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
    async fn test_add_and_select_tabs() {
        let manager = manager(&MemoryBackend::new()).await;
        let dock = DockStore::new(&manager);

        dock.add_tab(DockTab::new("t1", TabKind::Terminal, "Terminal"));
        dock.add_tab(DockTab::new("logs", TabKind::PodLogs, "Pod logs"));

        assert!(dock.is_open());
        assert_eq!(dock.tabs().len(), 2);
        assert_eq!(dock.selected_tab().map(|t| t.id), Some("logs".to_string()));

        dock.select_tab("t1");
        assert_eq!(dock.selected_tab().map(|t| t.id), Some("t1".to_string()));

        dock.select_tab("missing");
        assert_eq!(dock.selected_tab().map(|t| t.id), Some("t1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_tabs() {
        let backend = MemoryBackend::new();
        let manager = manager(&backend).await;
        let dock = DockStore::new(&manager);

        let mut pinned = DockTab::new("pinned", TabKind::Terminal, "Pinned");
        pinned.pinned = true;
        dock.add_tab(pinned);
        dock.add_tab(DockTab::new("a", TabKind::EditResource, "A"));
        dock.add_tab(DockTab::new("b", TabKind::CreateResource, "B"));

        dock.close_tab("b");
        assert_eq!(dock.selected_tab().map(|t| t.id), Some("a".to_string()));

        dock.close_tab("pinned");
        assert_eq!(dock.tabs().len(), 2);

        dock.close_tab("a");
        assert_eq!(dock.selected_tab().map(|t| t.id), Some("pinned".to_string()));
        assert!(dock.is_open());

        manager.flush().await;
        assert_eq!(
            backend.contents(PATH),
            Some(json!({"dock": {
                "height": 300,
                "isOpen": true,
                "tabs": [{"id": "pinned", "kind": "terminal", "title": "Pinned", "pinned": true}],
                "selectedTabId": "pinned"
            }}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_last_tab_closes_dock() {
        let manager = manager(&MemoryBackend::new()).await;
        let dock = DockStore::new(&manager);

        dock.add_tab(DockTab::new("only", TabKind::InstallChart, "Install"));
        dock.close_tab("only");

        assert!(!dock.is_open());
        assert_eq!(dock.state(), DockState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_close_and_height() {
        let backend = MemoryBackend::new();
        let manager = manager(&backend).await;
        let dock = DockStore::new(&manager);

        dock.toggle();
        assert!(dock.is_open());
        dock.set_height(20);
        assert_eq!(dock.state().height, MIN_DOCK_HEIGHT);

        dock.toggle();
        dock.set_height(DEFAULT_DOCK_HEIGHT);
        manager.flush().await;
        // Back to defaults before the window elapsed: nothing to write
        assert_eq!(backend.save_count(), 0);
        assert!(backend.contents(PATH).is_none());
    }
}
