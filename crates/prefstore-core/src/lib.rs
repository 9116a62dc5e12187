//! Prefstore Core Library
//!
//! A reactive, disk-backed key-value store for application preferences.
//! One JSON document is kept per scope (the global app or a single
//! cluster); typed [`StorageHelper`] handles expose one top-level key of that
//! document each, with default-value elision and debounced, coalesced writes.
//!
//! # Example
//! ```ignore
//! let manager = StorageManager::construct(StorageConfig::default(), StorageScope::Global);
//! manager.initialize().await;
//!
//! let width = manager.create_storage("sidebar_width", 200.0_f64);
//! width.set(320.0);
//! assert_eq!(width.get(), 320.0);
//! ```

pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod factory;
pub mod helper;
pub mod manager;
pub mod scope;
pub mod stores;
pub mod value;

// Re-export commonly used types
pub use backend::{FsBackend, MemoryBackend, StorageBackend};
pub use config::StorageConfig;
pub use document::{DocumentChange, ReactiveDocument};
pub use error::{LoadError, SaveError, StorageError, StorageResult};
pub use events::Subscription;
pub use factory::StorageFactory;
pub use helper::{
    ChangeEvent, DocumentAdapter, HelperStatus, ItemLoad, MemoryAdapter, StorageAdapter,
    StorageHelper,
};
pub use manager::{SharedStorageManager, StorageManager};
pub use scope::{GLOBAL_SCOPE_ID, StorageScope};
pub use value::StorageValue;
