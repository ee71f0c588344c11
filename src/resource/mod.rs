//! Resource proxies
//!
//! Local objects standing in for remote queues, topics and subscriptions.
//! Each proxy implements [`RemoteResource`] and is provisioned with a
//! [`Provision`] policy when it is opened.
//!
//! # Architecture
//!
//! - [`queue`] / [`topic`] - named resources sharing [`named::NamedResource`]
//! - [`subscription`] - topic subscriptions, identified by server-assigned id
//! - [`message`] - message value objects returned by listings
//! - [`patch`] - JSON-Patch computation for metadata updates
//! - [`monitor`] - flattening of monitor statistics into display rows
//! - [`pager`] - marker/limit paging over list operations
//! - [`timestamp`] - server timestamps and their display form
//!
//! `ensure_exists` is not race safe: the resource can be deleted by someone
//! else right after it returns, so later calls may still fail with
//! [`Error::NotFound`].

pub mod message;
pub mod monitor;
mod named;
pub mod pager;
pub mod patch;
pub mod queue;
pub mod subscription;
pub mod timestamp;
pub mod topic;

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::future::Future;
use std::sync::OnceLock;

pub use message::{HandleDeleteReport, Message};
pub use monitor::{flatten, MonitorRow};
pub use pager::{FromListing, ListOptions, Pager};
pub use patch::{compute_patch, is_truthy, PatchOp};
pub use queue::Queue;
pub use subscription::Subscription;
pub use timestamp::Timestamp;
pub use topic::Topic;

/// Resource metadata as stored on the server
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Kind of remote resource, used in errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Queue,
    Topic,
    Subscription,
    Message,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Queue => "Queue",
            ResourceKind::Topic => "Topic",
            ResourceKind::Subscription => "Subscription",
            ResourceKind::Message => "Message",
        };
        f.write_str(name)
    }
}

/// What to do with the remote resource when a proxy is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provision {
    /// Local view only; the caller asserts the resource exists
    #[default]
    Local,
    /// Fetch, and create when the fetch reports absence
    AutoCreate,
    /// Always issue create (server-side upsert)
    ForceCreate,
}

/// Lifecycle of a proxy: `Unresolved -> Exists -> Deleted`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Unresolved,
    Exists,
    /// Terminal; every further call fails with `ResourceAlreadyDeleted`
    Deleted,
}

/// Fetch/create/delete capability shared by all proxies
pub trait RemoteResource: Send {
    fn kind(&self) -> ResourceKind;

    /// Human-readable identity used in errors
    fn identity(&self) -> String;

    fn lifecycle(&self) -> Lifecycle;

    /// Refresh local state from the server
    fn fetch(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn create(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn delete(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Fail fast once the proxy has been deleted
    fn ensure_live(&self) -> Result<()> {
        if self.lifecycle() == Lifecycle::Deleted {
            return Err(Error::ResourceAlreadyDeleted {
                kind: self.kind(),
                name: self.identity(),
            });
        }
        Ok(())
    }
}

/// Fetch the resource, creating it when the server reports it absent
pub async fn ensure_exists<R: RemoteResource>(resource: &mut R) -> Result<()> {
    match resource.fetch().await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            tracing::debug!(
                "{} '{}' not found, creating it",
                resource.kind(),
                resource.identity()
            );
            resource.create().await
        },
        Err(e) => Err(e),
    }
}

/// Apply a provisioning policy to a freshly built proxy
pub async fn provision<R: RemoteResource>(resource: &mut R, provision: Provision) -> Result<()> {
    match provision {
        Provision::Local => Ok(()),
        Provision::AutoCreate => ensure_exists(resource).await,
        Provision::ForceCreate => resource.create().await,
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("name pattern is valid"))
}

/// Queue and topic names: ASCII letters, digits, underscores and dashes
pub fn validate_name(kind: ResourceKind, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::EmptyName(kind));
    }
    if !name_pattern().is_match(name) {
        return Err(Error::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["t1", "orders", "a_b-c", "ABC123", "-_-"] {
            assert!(validate_name(ResourceKind::Topic, name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["a/b", "with space", "ünïcode", "dot.ted", "new\nline"] {
            let err = validate_name(ResourceKind::Topic, name).unwrap_err();
            assert!(matches!(err, Error::InvalidName { .. }), "{name}");
        }
    }

    #[test]
    fn test_empty_name_has_its_own_error() {
        let err = validate_name(ResourceKind::Topic, "").unwrap_err();
        assert!(matches!(err, Error::EmptyName(ResourceKind::Topic)));
        assert_eq!(err.to_string(), "Topic name does not have a value");
    }
}
