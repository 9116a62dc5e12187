//! Prefstore
//!
//! Reactive, disk-backed preference storage. This crate re-exports
//! [`prefstore_core`]; see its documentation for the storage model.

pub use prefstore_core::*;
