//! Field-by-field merging of configuration tiers.
//!
//! Objects merge recursively, everything else is replaced, and a null in the
//! overlay means "not specified" so the lower tier's value survives.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// ```
/// use serde_json::json;
/// use taskhub::config::deep_merge;
///
/// let defaults = json!({"server": {"host": "127.0.0.1", "port": 8080}});
/// let project = json!({"server": {"port": 9000}});
/// assert_eq!(
///     deep_merge(defaults, project),
///     json!({"server": {"host": "127.0.0.1", "port": 9000}})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let next = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, next);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge tiers lowest first.
pub fn deep_merge_all(tiers: impl IntoIterator<Item = Value>) -> Value {
    tiers.into_iter().fold(Value::Null, deep_merge)
}
