//! Messages
//!
//! Messages are plain values read from listings; they carry consumption
//! state (status, claim handle, consume count) next to the usual body and
//! TTL.

use super::pager::FromListing;
use super::timestamp::{self, Timestamp};
use crate::client::Client;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message information from a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub age: Option<u64>,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub status_end: Option<Timestamp>,
    /// Claim handle, needed by [`crate::resource::Queue::delete_by_handles`]
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub consume_count: Option<u64>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub first_consumed_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub next_consume_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub created_at: Option<Timestamp>,
}

impl Message {
    pub fn status_end_time(&self) -> String {
        timestamp::render(self.status_end)
    }

    pub fn first_consumed_at(&self) -> String {
        timestamp::render(self.first_consumed_at)
    }

    pub fn next_consume_at(&self) -> String {
        timestamp::render(self.next_consume_at)
    }

    pub fn created_at(&self) -> String {
        timestamp::render(self.created_at)
    }
}

impl<T> FromListing<T> for Message {
    const KEY: &'static str = "messages";

    fn from_listing(_client: &Client<T>, item: &Value) -> Result<Self> {
        Message::deserialize(item).map_err(|e| Error::malformed("message_list", e.to_string()))
    }
}

/// Outcome of a batch delete by claim handles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleDeleteReport {
    #[serde(default)]
    pub successful: Vec<String>,
    #[serde(default)]
    pub expired: Vec<String>,
    #[serde(default)]
    pub invalid: Vec<String>,
}

impl HandleDeleteReport {
    /// Interpret the server's answer; an empty answer means every handle went through
    pub(crate) fn from_response(handles: &[String], content: Option<Value>) -> Result<Self> {
        match content {
            None | Some(Value::Null) => Ok(Self {
                successful: handles.to_vec(),
                ..Self::default()
            }),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| Error::malformed("message_delete_by_handles", e.to_string())),
        }
    }

    /// True when every handle was deleted
    pub fn is_complete(&self) -> bool {
        self.expired.is_empty() && self.invalid.is_empty()
    }
}
