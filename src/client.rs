//! Messaging Client
//!
//! Main entry point: dispatches named operations through a transport and
//! hands out resource proxies and pagers.

use crate::config::ConnectionSettings;
use crate::error::Result;
use crate::operation::{self, OperationRegistry, Params, Request};
use crate::resource::{ListOptions, Pager, Provision, Queue, Subscription, Topic};
use crate::transport::{HttpTransport, Response, Transport};
use serde_json::Value;
use std::sync::Arc;

/// Build a parameter map from name/value pairs
pub fn params<const N: usize>(pairs: [(&str, Value); N]) -> Params {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Main messaging client
pub struct Client<T> {
    transport: Arc<T>,
    registry: &'static OperationRegistry,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            registry: self.registry,
        }
    }
}

impl Client<HttpTransport> {
    /// Create a client talking HTTP to the configured endpoint
    pub fn connect(settings: &ConnectionSettings) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(settings)?))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            registry: operation::registry(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn registry(&self) -> &'static OperationRegistry {
        self.registry
    }

    /// Resolve and build a request without sending it
    pub fn request(&self, operation: &str, params: &Params, body: Option<&Value>) -> Result<Request> {
        let descriptor = self.registry.lookup(operation)?;
        operation::build(descriptor, params, body)
    }

    /// Invoke a named operation
    pub async fn call(
        &self,
        operation: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<Response> {
        let request = self.request(operation, params, body)?;
        tracing::debug!("call: operation={}, path={}", operation, request.path);
        self.transport.send(request).await
    }

    /// Returns a queue proxy
    pub async fn queue(&self, name: &str, provision: Provision) -> Result<Queue<T>> {
        Queue::open(self.clone(), name, provision).await
    }

    /// Returns a topic proxy
    pub async fn topic(&self, name: &str, provision: Provision) -> Result<Topic<T>> {
        Topic::open(self.clone(), name, provision).await
    }

    /// Subscribe `subscriber` to a topic, creating the subscription
    pub async fn subscribe(
        &self,
        topic_name: &str,
        subscriber: &str,
        options: crate::resource::Metadata,
    ) -> Result<Subscription<T>> {
        let mut subscription = Subscription::new(self.clone(), topic_name)?
            .with_subscriber(subscriber)
            .with_options(options);
        subscription.provision(Provision::ForceCreate).await?;
        Ok(subscription)
    }

    /// Returns an existing subscription, fetched by id
    pub async fn subscription(&self, topic_name: &str, id: &str) -> Result<Subscription<T>> {
        let mut subscription = Subscription::new(self.clone(), topic_name)?.with_id(id);
        subscription.provision(Provision::AutoCreate).await?;
        Ok(subscription)
    }

    /// Pages through the queues
    pub fn queues(&self, options: &ListOptions) -> Pager<T, Queue<T>> {
        Pager::new(self.clone(), "queue_list", options.to_params())
    }

    /// Pages through the topics
    pub fn topics(&self, options: &ListOptions) -> Pager<T, Topic<T>> {
        Pager::new(self.clone(), "topic_list", options.to_params())
    }

    /// Pages through the subscriptions of a topic
    pub fn subscriptions(
        &self,
        topic_name: &str,
        options: &ListOptions,
    ) -> Pager<T, Subscription<T>> {
        let mut params = options.to_params();
        params.insert(
            "topic_name".to_string(),
            Value::String(topic_name.to_string()),
        );
        Pager::new(self.clone(), "subscription_list", params)
    }
}
