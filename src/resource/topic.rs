//! Topics
//!
//! A topic fans published messages out to its subscriptions. Topic names
//! may only contain ASCII letters, digits, underscores and dashes.

use super::monitor::MonitorRow;
use super::named::{NamedResource, Operations};
use super::pager::{FromListing, ListOptions, Pager};
use super::subscription::Subscription;
use super::{provision, Lifecycle, Metadata, Provision, RemoteResource, ResourceKind};
use crate::client::Client;
use crate::error::Result;
use crate::transport::Transport;
use serde_json::{json, Value};

pub(crate) static TOPIC_OPERATIONS: Operations = Operations {
    kind: ResourceKind::Topic,
    param: "topic_name",
    section: "topic",
    get: "topic_get",
    create: "topic_create",
    update: "topic_update",
    delete: "topic_delete",
    monitor: "topic_get_monitor",
};

/// Proxy for a remote topic
pub struct Topic<T> {
    inner: NamedResource<T>,
}

impl<T: Transport> Topic<T> {
    /// Local, unresolved proxy; validates the name but sends nothing
    pub fn new(client: Client<T>, name: &str) -> Result<Self> {
        Ok(Self {
            inner: NamedResource::new(client, &TOPIC_OPERATIONS, name)?,
        })
    }

    /// Metadata sent along when the topic is created
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.inner.metadata = Some(metadata);
        self
    }

    /// Build a proxy and apply `provision` to it
    pub async fn open(client: Client<T>, name: &str, provision: Provision) -> Result<Self> {
        let mut topic = Self::new(client, name)?;
        topic.provision(provision).await?;
        Ok(topic)
    }

    pub async fn provision(&mut self, policy: Provision) -> Result<()> {
        provision(self, policy).await
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn href(&self) -> Option<&str> {
        self.inner.href.as_deref()
    }

    /// ISO-8601 creation time, or `--`
    pub fn created_at(&self) -> String {
        self.inner.created_at()
    }

    /// ISO-8601 last update time, or `--`
    pub fn updated_at(&self) -> String {
        self.inner.updated_at()
    }

    pub fn cached_metadata(&self) -> Option<&Metadata> {
        self.inner.metadata.as_ref()
    }

    /// Metadata, fetched from the server on first access
    pub async fn metadata(&mut self) -> Result<&Metadata> {
        self.inner.metadata().await
    }

    /// Replace existing metadata values; see [`crate::resource::compute_patch`]
    pub async fn update_metadata(&mut self, new: &Metadata) -> Result<&Metadata> {
        self.inner.update_metadata(new).await
    }

    /// Flat monitor row for this topic
    pub async fn monitor(&mut self) -> Result<MonitorRow> {
        self.inner.monitor().await
    }

    /// Publish one or more messages to every subscriber
    pub async fn publish(&self, messages: Vec<Value>) -> Result<Value> {
        let body = json!({ "messages": messages });
        let response = self.inner.call("topic_publish", Some(&body)).await?;
        tracing::debug!("Published to topic '{}'", self.inner.name);
        Ok(response.into_value())
    }

    /// Pages through the subscriptions of this topic
    pub fn subscriptions(&self, options: &ListOptions) -> Result<Pager<T, Subscription<T>>> {
        self.inner.ensure_live()?;
        Ok(self.inner.client.subscriptions(&self.inner.name, options))
    }
}

impl<T: Transport> RemoteResource for Topic<T> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Topic
    }

    fn identity(&self) -> String {
        self.inner.name.clone()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.inner.state
    }

    async fn fetch(&mut self) -> Result<()> {
        self.inner.fetch().await
    }

    async fn create(&mut self) -> Result<()> {
        self.inner.create().await
    }

    async fn delete(&mut self) -> Result<()> {
        self.inner.delete().await
    }
}

impl<T: Transport> FromListing<T> for Topic<T> {
    const KEY: &'static str = "topics";

    fn from_listing(client: &Client<T>, item: &Value) -> Result<Self> {
        Ok(Self {
            inner: NamedResource::from_listing(client.clone(), &TOPIC_OPERATIONS, item)?,
        })
    }
}
