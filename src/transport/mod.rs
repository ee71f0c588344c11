//! Transport abstraction
//!
//! A transport takes a built [`Request`] and returns the server's
//! [`Response`]. The library never talks to the network directly; the
//! [`http`] module provides the `reqwest`-backed implementation used by
//! the CLI.

pub mod http;
#[cfg(test)]
pub(crate) mod testing;

use crate::error::{Error, Result};
use crate::operation::Request;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;

pub use http::HttpTransport;

/// Sends requests to the messaging service
pub trait Transport: Send + Sync {
    /// Send one request; a 404 must surface as [`Error::ResourceNotFound`]
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

/// Response returned by a transport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// Raw body, possibly empty
    pub content: String,
    /// Parsed body, `None` when the body was empty
    pub deserialized_content: Option<Value>,
}

impl Response {
    /// Parse a raw body received for `operation`
    pub fn from_body(
        status: u16,
        headers: HashMap<String, String>,
        content: String,
        operation: &str,
    ) -> Result<Self> {
        let deserialized_content = if content.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(&content)
                    .map_err(|e| Error::malformed(operation, e.to_string()))?,
            )
        };

        Ok(Self {
            status,
            headers,
            content,
            deserialized_content,
        })
    }

    /// Response carrying a JSON body
    pub fn json(status: u16, value: Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            content: value.to_string(),
            deserialized_content: Some(value),
        }
    }

    /// Response with no body (e.g. 204)
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// True when the body is absent, `null` or an empty object
    pub fn is_empty(&self) -> bool {
        match &self.deserialized_content {
            None | Some(Value::Null) => true,
            Some(Value::Object(map)) => map.is_empty(),
            Some(_) => false,
        }
    }

    pub fn into_value(self) -> Value {
        self.deserialized_content.unwrap_or(Value::Null)
    }
}
