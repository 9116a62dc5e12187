//! Selected namespaces
//!
//! Absent means "no explicit selection"; the UI then falls back to its own
//! default namespace.

use crate::helper::StorageHelper;
use crate::manager::StorageManager;
use std::sync::Arc;

pub const SELECTED_NAMESPACES_KEY: &str = "selected_namespaces";

#[derive(Debug, Clone)]
pub struct NamespaceSelectionStore {
    storage: Arc<StorageHelper<Option<Vec<String>>>>,
}

impl NamespaceSelectionStore {
    pub fn new(manager: &StorageManager) -> Self {
        Self {
            storage: manager.create_storage(SELECTED_NAMESPACES_KEY, None),
        }
    }

    /// Explicitly selected namespaces, if any
    pub fn selected(&self) -> Option<Vec<String>> {
        self.storage.get()
    }

    pub fn is_selected(&self, namespace: &str) -> bool {
        self.storage
            .get()
            .is_some_and(|selected| selected.iter().any(|ns| ns == namespace))
    }

    /// Replace the selection. Duplicates are dropped; order is kept.
    pub fn select<I, S>(&self, namespaces: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected: Vec<String> = Vec::new();
        for namespace in namespaces {
            let namespace = namespace.into();
            if !selected.contains(&namespace) {
                selected.push(namespace);
            }
        }
        self.storage.set(Some(selected));
    }

    /// Add or remove one namespace. Removing the last one clears the selection.
    pub fn toggle(&self, namespace: &str) {
        self.storage.merge_with(|draft| {
            let selected = draft.get_or_insert_with(Vec::new);
            match selected.iter().position(|ns| ns == namespace) {
                Some(index) => {
                    selected.remove(index);
                }
                None => selected.push(namespace.to_string()),
            }
            if selected.is_empty() {
                *draft = None;
            }
            None
        });
    }

    pub fn clear(&self) {
        self.storage.reset();
    }

    pub fn storage(&self) -> &Arc<StorageHelper<Option<Vec<String>>>> {
        &self.storage
    }
}
