//! Table sort preferences

use crate::helper::StorageHelper;
use crate::manager::StorageManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TABLE_SETTINGS_KEY: &str = "table_settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort state of one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSortParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<SortOrder>,
}

impl TableSortParams {
    pub fn by(column: impl Into<String>) -> Self {
        Self {
            sort_by: Some(column.into()),
            order_by: None,
        }
    }

    pub fn ordered(mut self, order: SortOrder) -> Self {
        self.order_by = Some(order);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableSettings {
    /// Keyed by table id
    pub sort_params: BTreeMap<String, TableSortParams>,
}

/// Remembers how each table is sorted
#[derive(Debug, Clone)]
pub struct TableSettingsStore {
    storage: Arc<StorageHelper<TableSettings>>,
}

impl TableSettingsStore {
    pub fn new(manager: &StorageManager) -> Self {
        Self {
            storage: manager.create_storage(TABLE_SETTINGS_KEY, TableSettings::default()),
        }
    }

    pub fn sort_params(&self, table_id: &str) -> Option<TableSortParams> {
        self.storage.get().sort_params.get(table_id).cloned()
    }

    pub fn set_sort_params(&self, table_id: &str, params: TableSortParams) {
        self.storage.merge_with(|draft| {
            draft.sort_params.insert(table_id.to_string(), params);
            None
        });
    }

    pub fn clear_sort_params(&self, table_id: &str) {
        self.storage.merge_with(|draft| {
            draft.sort_params.remove(table_id);
            None
        });
    }

    pub fn reset(&self) {
        self.storage.reset();
    }

    pub fn storage(&self) -> &Arc<StorageHelper<TableSettings>> {
        &self.storage
    }
}
