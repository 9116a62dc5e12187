//! JSON value utilities
//!
//! Structural equality and shallow merging are done on the serialized form,
//! so they behave the same for every stored type.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types that can be held by a storage helper
pub trait StorageValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> StorageValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Deep structural equality of two values' JSON forms.
///
/// Object key order is irrelevant. Values that fail to serialize are never
/// equal to anything.
pub fn deep_equal<T: Serialize + ?Sized>(a: &T, b: &T) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Apply `overlay` onto `target`.
///
/// An object overlay on an object target assigns each top-level field,
/// leaving the other fields in place. Any other overlay replaces the target.
pub fn shallow_merge(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(fields)) => {
            for (key, value) in fields {
                target.insert(key, value);
            }
        }
        (target, overlay) => *target = overlay,
    }
}

/// `true` for values treated as "nothing stored"
pub(crate) fn is_empty_item(value: &Value) -> bool {
    value.is_null()
}
