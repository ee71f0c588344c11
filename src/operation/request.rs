//! Request Builder
//!
//! Resolves a descriptor and a parameter set into a transport-ready
//! [`Request`]. Building is pure: nothing here touches the network.

use super::registry::{Descriptor, Method};
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Named parameters for an operation
pub type Params = Map<String, Value>;

/// Media type of a serialized body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    /// RFC 6902 patch document, as the v2 API expects it
    JsonPatch,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::JsonPatch => "application/openstack-messaging-v2.0-json-patch",
        }
    }
}

/// A request ready to hand to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub operation: String,
    pub method: Method,
    /// Path relative to the API root, e.g. `topics/t1`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub content_type: Option<ContentType>,
}

impl Request {
    /// Value of a query parameter
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Build a request for `descriptor`
pub fn build(descriptor: &Descriptor, params: &Params, body: Option<&Value>) -> Result<Request> {
    for name in &descriptor.required {
        if lookup(params, name).is_none() {
            return Err(Error::MissingParameter(name.clone()));
        }
    }

    for (name, value) in params {
        if value.is_null() {
            continue;
        }
        if let Some(expected) = descriptor.param_type(name) {
            if !expected.accepts(value) {
                return Err(Error::InvalidParameterType {
                    name: name.clone(),
                    expected,
                    actual: json_type_name(value),
                });
            }
        }
    }

    let (path, used) = render_path(&descriptor.path_template, params)?;

    let mut query = Vec::new();
    for (key, value) in params {
        if value.is_null() || used.contains(&key.as_str()) {
            continue;
        }
        if matches!(descriptor.method, Method::Get | Method::Delete) {
            query.push((key.clone(), stringify(value)));
        } else {
            tracing::debug!(
                "{}: dropping parameter '{}' from {} request",
                descriptor.name,
                key,
                descriptor.method
            );
        }
    }

    let (body, content_type) = match body {
        Some(body) if descriptor.method.carries_body() => {
            let content_type = if descriptor.method == Method::Patch && body.is_array() {
                ContentType::JsonPatch
            } else {
                ContentType::Json
            };
            let text = serde_json::to_string(body).map_err(Error::InvalidJson)?;
            (Some(text), Some(content_type))
        },
        Some(_) => {
            tracing::debug!(
                "{}: {} requests carry no body, ignoring it",
                descriptor.name,
                descriptor.method
            );
            (None, None)
        },
        None => (None, None),
    };

    Ok(Request {
        operation: descriptor.name.clone(),
        method: descriptor.method,
        path,
        query,
        body,
        content_type,
    })
}

fn lookup<'a>(params: &'a Params, name: &str) -> Option<&'a Value> {
    params.get(name).filter(|v| !v.is_null())
}

/// Substitute every `{placeholder}`; returns the path and the names consumed
fn render_path<'t>(template: &'t str, params: &Params) -> Result<(String, Vec<&'t str>)> {
    let mut path = String::with_capacity(template.len());
    let mut used = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        path.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            // Unbalanced brace, keep it literally
            path.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let name = &after[..end];
        let value =
            lookup(params, name).ok_or_else(|| Error::UnresolvedPlaceholder(name.to_string()))?;
        path.push_str(&urlencoding::encode(&stringify(value)));
        used.push(name);
        rest = &after[end + 1..];
    }
    path.push_str(rest);

    Ok((path, used))
}

/// Render a parameter value for a path segment or query string
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
