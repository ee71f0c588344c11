//! Metadata patches
//!
//! Metadata updates are sent as RFC 6902 `replace` operations. Only keys
//! whose current value is truthy are replaced: a key that is absent, or
//! holds `""`, `0`, `false`, `null`, `[]` or `{}`, produces no operation
//! even when the caller asked to set it. New keys can therefore never be
//! added through a patch.

use super::Metadata;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchKind {
    Replace,
}

/// One JSON-Patch operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOp {
    pub op: PatchKind,
    pub path: String,
    pub value: Value,
}

impl PatchOp {
    pub fn replace(key: &str, value: Value) -> Self {
        Self {
            op: PatchKind::Replace,
            path: format!("/metadata/{}", escape_pointer(key)),
            value,
        }
    }
}

/// Truthiness of a JSON value: null, false, zero and empty values are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Operations turning `current` into `new`, in `new`'s key order
pub fn compute_patch(current: &Metadata, new: &Metadata) -> Vec<PatchOp> {
    new.iter()
        .filter(|(key, _)| current.get(key.as_str()).is_some_and(is_truthy))
        .map(|(key, value)| PatchOp::replace(key, value.clone()))
        .collect()
}

/// Request body for a list of operations
pub fn to_body(ops: &[PatchOp]) -> Value {
    Value::Array(
        ops.iter()
            .map(|op| {
                serde_json::json!({
                    "op": op.op,
                    "path": op.path,
                    "value": op.value,
                })
            })
            .collect(),
    )
}

/// RFC 6901 escaping of a single pointer segment
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_only_truthy_existing_keys_are_replaced() {
        let ops = compute_patch(
            &meta(json!({"a": "x", "b": ""})),
            &meta(json!({"a": "y", "b": "z", "c": "w"})),
        );
        assert_eq!(ops, vec![PatchOp::replace("a", json!("y"))]);
        assert_eq!(ops[0].path, "/metadata/a");
    }

    #[test]
    fn test_falsy_values_are_skipped() {
        let current = meta(json!({
            "zero": 0,
            "no": false,
            "none": null,
            "empty_list": [],
            "empty_map": {},
            "yes": true,
            "ttl": 3600,
        }));
        let new = meta(json!({
            "zero": 1,
            "no": true,
            "none": "set",
            "empty_list": [1],
            "empty_map": {"k": "v"},
            "yes": false,
            "ttl": 60,
        }));
        let paths: Vec<String> = compute_patch(&current, &new)
            .into_iter()
            .map(|op| op.path)
            .collect();
        assert_eq!(paths, vec!["/metadata/yes", "/metadata/ttl"]);
    }

    #[test]
    fn test_order_follows_new_metadata() {
        let current = meta(json!({"a": 1, "b": 2, "c": 3}));
        let new = meta(json!({"c": 30, "a": 10}));
        let ops = compute_patch(&current, &new);
        assert_eq!(ops[0].path, "/metadata/c");
        assert_eq!(ops[1].path, "/metadata/a");
    }

    #[test]
    fn test_body_shape() {
        let body = to_body(&[PatchOp::replace("a", json!(5))]);
        assert_eq!(
            body,
            json!([{"op": "replace", "path": "/metadata/a", "value": 5}])
        );
    }

    #[test]
    fn test_pointer_segments_are_escaped() {
        assert_eq!(PatchOp::replace("a/b~c", json!(1)).path, "/metadata/a~1b~0c");
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(0.5)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(is_truthy(&json!(" ")));
    }
}
