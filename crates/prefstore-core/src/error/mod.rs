//! Error types for prefstore
//!
//! Load and save failures are absorbed inside the storage layer: they are
//! logged and turned into "no persisted state" or a dropped write. The types
//! here exist so the adapter contract and the construction seams can say
//! precisely what went wrong.

mod types;

pub use types::{LoadError, SaveError, StorageError, StorageResult};
