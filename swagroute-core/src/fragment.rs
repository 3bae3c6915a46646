//! Documentation fragments and the one merge operation used to layer them
//!
//! A [`DocFragment`] is a partial swagger object (an operation, a whole document, ...).
//! Fragments from different sources are combined with [`deep_merge`]:
//! - a mapping merged over a mapping is merged key by key, recursively
//! - any other pair of values is resolved by replacing the old value with the new one

use serde_json::Map;
use serde_json::Value;

/// A partial swagger object
///
/// The underlying map preserves insertion order.
pub type DocFragment = Map<String, Value>;

/// Keys which are only meaningful on the document itself
///
/// They are removed from every fragment contributing to an operation.
pub const DOCUMENT_LEVEL_KEYS: &[&str] = &[
    "id",
    "info",
    "host",
    "basePath",
    "definitions",
    "securityDefinitions",
];

/// Keys which are only meaningful on an operation
///
/// They are removed from a document skeleton before it is merged into the document.
pub const OPERATION_LEVEL_KEYS: &[&str] = &["id", "parameters", "responses", "summary", "description"];

/// Merges `source` into `target`, `source` winning every conflict
pub fn deep_merge(target: &mut DocFragment, source: DocFragment) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

/// Merges `source` into `target`, `source` winning every conflict
///
/// Two objects are merged recursively. Any other combination replaces `target`.
pub fn merge_value(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => deep_merge(target, source),
        (target, source) => *target = source,
    }
}

/// Removes `keys` from `fragment` without disturbing the order of the remaining keys
pub fn strip_keys(fragment: &mut DocFragment, keys: &[&str]) {
    fragment.retain(|key, _| !keys.contains(&key.as_str()));
}

/// Converts a `json!` value into a [`DocFragment`]
///
/// Anything but an object yields an empty fragment.
pub fn fragment(value: Value) -> DocFragment {
    match value {
        Value::Object(map) => map,
        _ => DocFragment::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nested_objects_are_merged() {
        let mut target = fragment(json!({
            "responses": { "200": { "description": "ok" } },
            "produces": ["text/plain"],
        }));
        deep_merge(
            &mut target,
            fragment(json!({
                "responses": { "500": { "description": "oops" } },
            })),
        );

        assert_eq!(
            Value::Object(target),
            json!({
                "responses": {
                    "200": { "description": "ok" },
                    "500": { "description": "oops" },
                },
                "produces": ["text/plain"],
            })
        );
    }

    #[test]
    fn non_objects_are_replaced() {
        let mut target = fragment(json!({
            "produces": ["text/plain", "text/html"],
            "deprecated": { "since": "1.0" },
            "summary": "old",
        }));
        deep_merge(
            &mut target,
            fragment(json!({
                "produces": ["application/json"],
                "deprecated": true,
                "summary": null,
            })),
        );

        assert_eq!(
            Value::Object(target),
            json!({
                "produces": ["application/json"],
                "deprecated": true,
                "summary": null,
            })
        );
    }

    #[test]
    fn object_replaces_scalar() {
        let mut target = json!("scalar");
        merge_value(&mut target, json!({ "a": 1 }));
        assert_eq!(target, json!({ "a": 1 }));
    }

    #[test]
    fn merge_keeps_key_order() {
        let mut target = fragment(json!({ "b": 1, "a": 1 }));
        deep_merge(&mut target, fragment(json!({ "c": 1, "b": 2 })));

        let keys: Vec<_> = target.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(target["b"], json!(2));
    }

    #[test]
    fn strip_keeps_order_of_remaining_keys() {
        let mut skeleton = fragment(json!({
            "info": { "title": "api" },
            "parameters": [],
            "host": "localhost",
            "id": "default",
            "basePath": "/api",
        }));
        strip_keys(&mut skeleton, OPERATION_LEVEL_KEYS);

        let keys: Vec<_> = skeleton.keys().map(String::as_str).collect();
        assert_eq!(keys, ["info", "host", "basePath"]);
    }
}
