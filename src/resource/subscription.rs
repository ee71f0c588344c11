//! Topic subscriptions
//!
//! A subscription is identified by its topic and a server-assigned id.
//! Provisioning creates the subscription when a subscriber is known but no
//! id is, then reads it back once an id is available.

use super::pager::FromListing;
use super::{validate_name, Lifecycle, Metadata, Provision, RemoteResource, ResourceKind};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::operation::Params;
use crate::transport::{Response, Transport};
use serde_json::{json, Value};

/// Proxy for a subscription of a topic
pub struct Subscription<T> {
    client: Client<T>,
    topic_name: String,
    id: Option<String>,
    subscriber: Option<String>,
    options: Metadata,
    ttl: Option<i64>,
    confirmed: Option<bool>,
    state: Lifecycle,
}

impl<T: Transport> Subscription<T> {
    /// Local proxy for a subscription of `topic_name`; sends nothing
    pub fn new(client: Client<T>, topic_name: &str) -> Result<Self> {
        validate_name(ResourceKind::Topic, topic_name)?;
        Ok(Self {
            client,
            topic_name: topic_name.to_string(),
            id: None,
            subscriber: None,
            options: Metadata::new(),
            ttl: None,
            confirmed: None,
            state: Lifecycle::Unresolved,
        })
    }

    /// Delivery target, e.g. `http://example.com/hook` or `mailto:ops@example.com`
    pub fn with_subscriber(mut self, subscriber: &str) -> Self {
        self.subscriber = Some(subscriber.to_string());
        self
    }

    pub fn with_options(mut self, options: Metadata) -> Self {
        self.options = options;
        self
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Refer to an existing subscription
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Create and/or fetch according to `policy`
    ///
    /// `AutoCreate` only creates when a subscriber is known and no id is;
    /// `ForceCreate` always creates. Either way the subscription is read back
    /// once it has an id.
    pub async fn provision(&mut self, policy: Provision) -> Result<()> {
        let create = match policy {
            Provision::Local => return Ok(()),
            Provision::AutoCreate => self.id.is_none() && self.subscriber.is_some(),
            Provision::ForceCreate => true,
        };

        if create {
            if self.subscriber.is_none() && self.id.is_some() {
                // Known id without a subscriber: nothing to create from
                tracing::debug!("Subscription {} has no subscriber, fetching only", self.identity());
            } else {
                self.create().await?;
            }
        }

        if self.id.is_some() {
            self.fetch().await?;
        }
        Ok(())
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn subscriber(&self) -> Option<&str> {
        self.subscriber.as_deref()
    }

    pub fn options(&self) -> &Metadata {
        &self.options
    }

    pub fn ttl(&self) -> Option<i64> {
        self.ttl
    }

    /// Server-assigned confirmation flag, `None` until fetched
    pub fn confirmed(&self) -> Option<bool> {
        self.confirmed
    }

    /// Change subscriber, options or TTL
    ///
    /// The given fields are sent as-is and applied locally once the server
    /// accepted them.
    pub async fn update(&mut self, changes: Metadata) -> Result<()> {
        let body = Value::Object(changes.clone());
        self.call("subscription_update", Some(&body)).await?;
        self.apply(&changes);
        tracing::info!("Updated subscription {}", self.identity());
        Ok(())
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(
            "topic_name".to_string(),
            Value::String(self.topic_name.clone()),
        );
        if let Some(id) = &self.id {
            params.insert("subscription_id".to_string(), Value::String(id.clone()));
        }
        params
    }

    async fn call(&self, operation: &str, body: Option<&Value>) -> Result<Response> {
        self.ensure_live()?;
        self.client
            .call(operation, &self.params(), body)
            .await
            .map_err(|e| match e {
                Error::ResourceNotFound(_) => Error::NotFound {
                    kind: ResourceKind::Subscription,
                    name: self.identity(),
                },
                other => other,
            })
    }

    /// Copy the known fields of a detail, listing item or update body
    fn apply(&mut self, fields: &Metadata) {
        if let Some(subscriber) = fields.get("subscriber").and_then(Value::as_str) {
            self.subscriber = Some(subscriber.to_string());
        }
        if let Some(options) = fields.get("options") {
            self.options = options.as_object().cloned().unwrap_or_default();
        }
        if let Some(ttl) = fields.get("ttl").and_then(Value::as_i64) {
            self.ttl = Some(ttl);
        }
        if let Some(confirmed) = fields.get("confirmed").and_then(Value::as_bool) {
            self.confirmed = Some(confirmed);
        }
    }
}

impl<T: Transport> RemoteResource for Subscription<T> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Subscription
    }

    fn identity(&self) -> String {
        match &self.id {
            Some(id) => format!("{}/{}", self.topic_name, id),
            None => format!("{}/<unsaved>", self.topic_name),
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        self.state
    }

    async fn fetch(&mut self) -> Result<()> {
        let response = self.call("subscription_get", None).await?;
        if response.is_empty() {
            return Err(Error::NotFound {
                kind: ResourceKind::Subscription,
                name: self.identity(),
            });
        }

        match response.into_value() {
            Value::Object(detail) => self.apply(&detail),
            _ => {
                return Err(Error::malformed(
                    "subscription_get",
                    "subscription detail is not an object",
                ))
            },
        }
        self.state = Lifecycle::Exists;
        Ok(())
    }

    async fn create(&mut self) -> Result<()> {
        let Some(subscriber) = &self.subscriber else {
            return Err(Error::MissingParameter("subscriber".to_string()));
        };

        let mut body = json!({
            "subscriber": subscriber,
            "options": self.options,
        });
        if let Some(ttl) = self.ttl {
            body["ttl"] = Value::from(ttl);
        }

        let response = self.call("subscription_create", Some(&body)).await?;
        match response
            .into_value()
            .get("subscription_id")
            .and_then(Value::as_str)
        {
            Some(id) => self.id = Some(id.to_string()),
            None => tracing::warn!(
                "Subscription to topic '{}' created without an id in the answer",
                self.topic_name
            ),
        }

        tracing::info!("Created subscription {}", self.identity());
        self.state = Lifecycle::Exists;
        Ok(())
    }

    async fn delete(&mut self) -> Result<()> {
        self.call("subscription_delete", None).await?;
        tracing::info!("Deleted subscription {}", self.identity());
        self.state = Lifecycle::Deleted;
        Ok(())
    }
}

impl<T: Transport> FromListing<T> for Subscription<T> {
    const KEY: &'static str = "subscriptions";

    fn from_listing(client: &Client<T>, item: &Value) -> Result<Self> {
        let Some(fields) = item.as_object() else {
            return Err(Error::malformed(
                "subscription_list",
                "listing item is not an object",
            ));
        };
        let source = fields
            .get("source")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed("subscription_list", "listing item without a source"))?;

        let mut subscription = Self::new(client.clone(), source)?;
        subscription.id = fields.get("id").and_then(Value::as_str).map(str::to_string);
        subscription.apply(fields);
        subscription.state = Lifecycle::Exists;
        Ok(subscription)
    }
}
