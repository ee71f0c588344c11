//! Queues
//!
//! Queue proxies add purge, monitor statistics, message listing/posting and
//! batch deletion by claim handle on top of the shared named-resource core.

use super::message::{HandleDeleteReport, Message};
use super::monitor::MonitorRow;
use super::named::{NamedResource, Operations};
use super::pager::{FromListing, Pager};
use super::{provision, Lifecycle, Metadata, Provision, RemoteResource, ResourceKind};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::transport::Transport;
use serde_json::{json, Value};

pub(crate) static QUEUE_OPERATIONS: Operations = Operations {
    kind: ResourceKind::Queue,
    param: "queue_name",
    section: "queue",
    get: "queue_get",
    create: "queue_create",
    update: "queue_update",
    delete: "queue_delete",
    monitor: "queue_get_monitor",
};

/// Options for listing a queue's messages
#[derive(Debug, Clone, Default)]
pub struct MessageListOptions {
    pub marker: Option<String>,
    pub limit: Option<u64>,
    pub echo: bool,
    pub include_claimed: bool,
}

/// Proxy for a remote queue
pub struct Queue<T> {
    inner: NamedResource<T>,
}

impl<T: Transport> Queue<T> {
    /// Local, unresolved proxy; no request is sent
    pub fn new(client: Client<T>, name: &str) -> Result<Self> {
        Ok(Self {
            inner: NamedResource::new(client, &QUEUE_OPERATIONS, name)?,
        })
    }

    /// Metadata sent along when the queue is created
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.inner.metadata = Some(metadata);
        self
    }

    /// Build a proxy and apply `provision` to it
    pub async fn open(client: Client<T>, name: &str, provision: Provision) -> Result<Self> {
        let mut queue = Self::new(client, name)?;
        queue.provision(provision).await?;
        Ok(queue)
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

    /// Metadata as last seen, without any request
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

    /// Drop every message in the queue
    pub async fn purge(&self) -> Result<()> {
        self.inner.call("queue_purge", None).await?;
        tracing::info!("Purged queue '{}'", self.inner.name);
        Ok(())
    }

    /// Flat monitor row for this queue
    pub async fn monitor(&mut self) -> Result<MonitorRow> {
        self.inner.monitor().await
    }

    /// Post one or more messages; returns the server's answer
    pub async fn post(&self, messages: Vec<Value>) -> Result<Value> {
        let body = json!({ "messages": messages });
        Ok(self.inner.call("message_post", Some(&body)).await?.into_value())
    }

    /// Pages through the messages of this queue
    pub fn messages(&self, options: &MessageListOptions) -> Result<Pager<T, Message>> {
        self.inner.ensure_live()?;
        let mut params = self.inner.params();
        if let Some(marker) = &options.marker {
            params.insert("marker".to_string(), Value::String(marker.clone()));
        }
        if let Some(limit) = options.limit {
            params.insert("limit".to_string(), Value::from(limit));
        }
        if options.echo {
            params.insert("echo".to_string(), Value::Bool(true));
        }
        if options.include_claimed {
            params.insert("include_claimed".to_string(), Value::Bool(true));
        }
        Ok(Pager::new(self.inner.client.clone(), "message_list", params))
    }

    /// Delete messages by claim handle
    ///
    /// Not all-or-nothing: the report says which handles were deleted,
    /// which had expired and which were invalid.
    pub async fn delete_by_handles(&self, handles: &[String]) -> Result<HandleDeleteReport> {
        if handles.is_empty() {
            return Err(Error::MissingParameter("handles".to_string()));
        }

        let mut params = self.inner.params();
        params.insert("handles".to_string(), Value::String(handles.join(",")));
        let response = self
            .inner
            .call_with("message_delete_by_handles", &params, None)
            .await?;

        HandleDeleteReport::from_response(handles, response.deserialized_content)
    }
}

impl<T: Transport> RemoteResource for Queue<T> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Queue
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

impl<T: Transport> FromListing<T> for Queue<T> {
    const KEY: &'static str = "queues";

    fn from_listing(client: &Client<T>, item: &Value) -> Result<Self> {
        Ok(Self {
            inner: NamedResource::from_listing(client.clone(), &QUEUE_OPERATIONS, item)?,
        })
    }
}
