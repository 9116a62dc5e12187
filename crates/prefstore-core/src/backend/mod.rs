//! Backing store adapters
//!
//! A backend reads and writes one JSON blob per scope file. It performs I/O
//! only; deciding what a failure means is left to the document.

mod fs;
mod memory;
#[allow(clippy::module_inception)]
mod r#trait;

// Re-export all public APIs
pub use fs::FsBackend;
pub use memory::MemoryBackend;
pub use r#trait::StorageBackend;

#[cfg(test)]
pub use r#trait::MockStorageBackend;

/// JSON type name used in diagnostics
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
