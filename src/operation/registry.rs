//! Operation Registry - Load operation descriptors from JSON
//!
//! This module loads the operation tables embedded in the binary, merges
//! the extension table over the base table and provides lookup functions
//! for the rest of the crate.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

/// Base queue/message operations (compiled into the binary)
const BASE_SCHEMA: &str = include_str!("../schema/v2.json");

/// Topic, subscription and monitor operations, applied over the base table
const EXTENSION_SCHEMA: &str = include_str!("../schema/pubsub.json");

/// HTTP verb of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether requests with this verb carry a serialized body
    pub fn carries_body(self) -> bool {
        matches!(self, Method::Put | Method::Post | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive type a parameter must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
}

impl ParamType {
    /// Check a JSON value against this type
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => f.write_str("a string"),
            ParamType::Integer => f.write_str("an integer"),
            ParamType::Boolean => f.write_str("a boolean"),
        }
    }
}

/// Parameter definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ParamDef {
    #[serde(rename = "type")]
    pub kind: ParamType,
}

/// Operation definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct Descriptor {
    /// Filled from the table key when the file is loaded
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "ref")]
    pub path_template: String,
    pub method: Method,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default, rename = "properties")]
    pub param_schema: BTreeMap<String, ParamDef>,
}

impl Descriptor {
    /// Names of the `{placeholder}` segments in the path template, in order
    pub fn placeholders(&self) -> Vec<&str> {
        placeholders(&self.path_template)
    }

    /// Declared type of a parameter
    pub fn param_type(&self, name: &str) -> Option<ParamType> {
        self.param_schema.get(name).map(|def| def.kind)
    }

    /// Every placeholder and every required name must be declared
    pub fn check(&self) -> std::result::Result<(), String> {
        for placeholder in self.placeholders() {
            if !self.param_schema.contains_key(placeholder) {
                return Err(format!(
                    "{}: placeholder '{}' is not declared",
                    self.name, placeholder
                ));
            }
        }
        for required in &self.required {
            if !self.param_schema.contains_key(required) {
                return Err(format!(
                    "{}: required parameter '{}' is not declared",
                    self.name, required
                ));
            }
        }
        Ok(())
    }
}

/// Split `{name}` placeholders out of a path template
pub(crate) fn placeholders(template: &str) -> Vec<&str> {
    template
        .split('{')
        .skip(1)
        .filter_map(|chunk| chunk.split_once('}').map(|(name, _)| name))
        .collect()
}

/// Root structure of schema/*.json
#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    operations: HashMap<String, Descriptor>,
}

/// Name -> descriptor table
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: HashMap<String, Descriptor>,
}

impl OperationRegistry {
    /// Parse one operation table
    pub fn from_json(content: &str) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(content).map_err(Error::InvalidJson)?;
        let operations = file
            .operations
            .into_iter()
            .map(|(name, mut descriptor)| {
                descriptor.name = name.clone();
                (name, descriptor)
            })
            .collect();
        Ok(Self { operations })
    }

    /// Merge `extension` over `base`; same-named entries are replaced
    pub fn merged(base: Self, extension: Self) -> Self {
        let mut operations = base.operations;
        operations.extend(extension.operations);
        Self { operations }
    }

    /// Get a descriptor by operation name
    pub fn lookup(&self, name: &str) -> Result<&Descriptor> {
        self.operations
            .get(name)
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// All operation names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.operations.values()
    }
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();

/// Get the operation registry (loads from embedded JSON on first access)
pub fn registry() -> &'static OperationRegistry {
    REGISTRY.get_or_init(|| {
        let base = OperationRegistry::from_json(BASE_SCHEMA)
            .unwrap_or_else(|e| panic!("Failed to parse embedded base schema: {}", e));
        let extension = OperationRegistry::from_json(EXTENSION_SCHEMA)
            .unwrap_or_else(|e| panic!("Failed to parse embedded extension schema: {}", e));

        let merged = OperationRegistry::merged(base, extension);
        for descriptor in merged.descriptors() {
            if let Err(reason) = descriptor.check() {
                panic!("Invalid embedded operation: {}", reason);
            }
        }

        tracing::debug!("Loaded {} operations", merged.names().len());
        merged
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Operations the proxies, pager and CLI dispatch by name
    const REFERENCED: &[&str] = &[
        "queue_list",
        "queue_create",
        "queue_get",
        "queue_update",
        "queue_delete",
        "queue_purge",
        "queue_get_monitor",
        "message_list",
        "message_post",
        "message_delete_by_handles",
        "topic_list",
        "topic_get",
        "topic_create",
        "topic_update",
        "topic_delete",
        "topic_get_monitor",
        "topic_publish",
        "subscription_create",
        "subscription_update",
        "subscription_delete",
        "subscription_list",
        "subscription_get",
    ];

    #[test]
    fn test_registry_loads_successfully() {
        let registry = registry();
        assert!(!registry.names().is_empty(), "Registry should have operations");
    }

    #[test]
    fn test_every_referenced_operation_resolves() {
        let registry = registry();
        for name in REFERENCED {
            assert!(registry.lookup(name).is_ok(), "{} should resolve", name);
        }
    }

    #[test]
    fn test_every_descriptor_declares_its_placeholders() {
        for descriptor in registry().descriptors() {
            assert_eq!(descriptor.check(), Ok(()));
        }
    }

    #[test]
    fn test_extension_overrides_base_purge() {
        let base = OperationRegistry::from_json(BASE_SCHEMA).unwrap();
        assert_eq!(base.lookup("queue_purge").unwrap().method, Method::Post);

        let purge = registry().lookup("queue_purge").unwrap();
        assert_eq!(purge.method, Method::Delete);
        assert_eq!(purge.path_template, "queues/{queue_name}/purge");
    }

    #[test]
    fn test_base_entries_survive_merge() {
        let queue_get = registry().lookup("queue_get").unwrap();
        assert_eq!(queue_get.method, Method::Get);
        assert_eq!(queue_get.name, "queue_get");
    }

    #[test]
    fn test_subscription_table_matches_api() {
        let update = registry().lookup("subscription_update").unwrap();
        assert_eq!(update.method, Method::Patch);
        assert_eq!(
            update.path_template,
            "topics/{topic_name}/subscriptions/{subscription_id}"
        );
        assert_eq!(update.placeholders(), vec!["topic_name", "subscription_id"]);
        assert_eq!(update.required, vec!["topic_name", "subscription_id"]);
    }

    #[test]
    fn test_unknown_operation() {
        let err = registry().lookup("topic_explode").unwrap_err();
        assert!(matches!(err, Error::UnknownOperation(name) if name == "topic_explode"));
    }

    #[test]
    fn test_check_reports_undeclared_placeholder() {
        let registry = OperationRegistry::from_json(
            r#"{"operations": {"broken": {"ref": "things/{thing}", "method": "GET"}}}"#,
        )
        .unwrap();
        let err = registry.lookup("broken").unwrap().check().unwrap_err();
        assert!(err.contains("thing"));
    }

    #[test]
    fn test_param_types() {
        assert!(ParamType::Integer.accepts(&serde_json::json!(10)));
        assert!(!ParamType::Integer.accepts(&serde_json::json!(1.5)));
        assert!(!ParamType::String.accepts(&serde_json::json!(true)));
        assert!(ParamType::Boolean.accepts(&serde_json::json!(false)));
    }
}
