//! State and operations shared by queues and topics
//!
//! Both are identified by a name, carry metadata and timestamps, and
//! expose the same get/create/update/delete/monitor operations under
//! different operation names.

use super::monitor::{flatten, MonitorRow};
use super::patch::{compute_patch, to_body};
use super::timestamp::{self, Timestamp};
use super::{validate_name, Lifecycle, Metadata, ResourceKind};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::operation::Params;
use crate::transport::{Response, Transport};
use serde_json::{Map, Value};

/// Operation names and response shape of one named resource kind
#[derive(Debug)]
pub(crate) struct Operations {
    pub kind: ResourceKind,
    /// Placeholder holding the name, e.g. `queue_name`
    pub param: &'static str,
    /// Key wrapping the detail response, e.g. `{"queue": {...}}`
    pub section: &'static str,
    pub get: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
    pub monitor: &'static str,
}

pub(crate) struct NamedResource<T> {
    pub client: Client<T>,
    pub ops: &'static Operations,
    pub name: String,
    pub href: Option<String>,
    /// `None` until fetched or supplied
    pub metadata: Option<Metadata>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub state: Lifecycle,
}

impl<T: Transport> NamedResource<T> {
    pub fn new(client: Client<T>, ops: &'static Operations, name: &str) -> Result<Self> {
        validate_name(ops.kind, name)?;
        Ok(Self {
            client,
            ops,
            name: name.to_string(),
            href: None,
            metadata: None,
            created_at: None,
            updated_at: None,
            state: Lifecycle::Unresolved,
        })
    }

    /// Build from one item of a list response; listed resources exist
    pub fn from_listing(client: Client<T>, ops: &'static Operations, item: &Value) -> Result<Self> {
        let name = item
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed(ops.get, "listing item without a name"))?;

        let mut resource = Self::new(client, ops, name)?;
        resource.href = item.get("href").and_then(Value::as_str).map(str::to_string);
        resource.metadata = item.get("metadata").and_then(Value::as_object).cloned();
        resource.created_at = item.get("created_at").and_then(Timestamp::from_value);
        resource.updated_at = item.get("updated_at").and_then(Timestamp::from_value);
        resource.state = Lifecycle::Exists;
        Ok(resource)
    }

    pub fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(self.ops.param.to_string(), Value::String(self.name.clone()));
        params
    }

    pub fn ensure_live(&self) -> Result<()> {
        if self.state == Lifecycle::Deleted {
            return Err(Error::ResourceAlreadyDeleted {
                kind: self.ops.kind,
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Invoke an operation on this resource; a 404 becomes `NotFound`
    pub async fn call(&self, operation: &str, body: Option<&Value>) -> Result<Response> {
        self.call_with(operation, &self.params(), body).await
    }

    pub async fn call_with(
        &self,
        operation: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<Response> {
        self.ensure_live()?;
        self.client
            .call(operation, params, body)
            .await
            .map_err(|e| self.not_found(e))
    }

    fn not_found(&self, error: Error) -> Error {
        match error {
            Error::ResourceNotFound(_) => Error::NotFound {
                kind: self.ops.kind,
                name: self.name.clone(),
            },
            other => other,
        }
    }

    /// Fetch the detail section; `None` when the server returned nothing
    async fn detail(&mut self) -> Result<Option<Map<String, Value>>> {
        let response = self.call(self.ops.get, None).await?;
        let section = response
            .into_value()
            .get_mut(self.ops.section)
            .map(Value::take)
            .and_then(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            });

        if let Some(section) = &section {
            self.metadata = Some(
                section
                    .get("metadata")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
            );
            self.created_at = section.get("created_at").and_then(Timestamp::from_value);
            self.updated_at = section.get("updated_at").and_then(Timestamp::from_value);
            if let Some(href) = section.get("href").and_then(Value::as_str) {
                self.href = Some(href.to_string());
            }
            self.state = Lifecycle::Exists;
        }

        Ok(section)
    }

    pub async fn fetch(&mut self) -> Result<()> {
        match self.detail().await? {
            Some(_) => Ok(()),
            None => Err(Error::NotFound {
                kind: self.ops.kind,
                name: self.name.clone(),
            }),
        }
    }

    pub async fn create(&mut self) -> Result<()> {
        let body = self
            .metadata
            .as_ref()
            .filter(|m| !m.is_empty())
            .map(|m| Value::Object(m.clone()));
        self.call(self.ops.create, body.as_ref()).await?;
        tracing::info!("Created {} '{}'", self.ops.kind, self.name);
        self.state = Lifecycle::Exists;
        Ok(())
    }

    pub async fn delete(&mut self) -> Result<()> {
        self.call(self.ops.delete, None).await?;
        tracing::info!("Deleted {} '{}'", self.ops.kind, self.name);
        self.state = Lifecycle::Deleted;
        Ok(())
    }

    /// Cached metadata, fetched on first access
    pub async fn metadata(&mut self) -> Result<&Metadata> {
        self.ensure_live()?;
        if self.metadata.is_none() {
            self.fetch().await?;
        }
        Ok(self.metadata.get_or_insert_with(Metadata::new))
    }

    /// Replace the values of existing metadata keys
    ///
    /// The current metadata is re-read from the server first and the patch
    /// is computed against it. Afterwards the cache holds what the server
    /// returned, not what was sent.
    pub async fn update_metadata(&mut self, new: &Metadata) -> Result<&Metadata> {
        self.fetch().await?;
        let current = self.metadata.clone().unwrap_or_default();
        let ops = compute_patch(&current, new);

        if ops.is_empty() {
            tracing::debug!(
                "{} '{}': no existing keys to replace, skipping update",
                self.ops.kind,
                self.name
            );
        } else {
            let response = self.call(self.ops.update, Some(&to_body(&ops))).await?;
            match response.into_value() {
                Value::Object(updated) => self.metadata = Some(updated),
                // Nothing echoed back, read the server state instead
                _ => self.fetch().await?,
            }
        }

        Ok(self.metadata.get_or_insert_with(Metadata::new))
    }

    /// Statistics merged with a fresh detail fetch
    ///
    /// Two sequential requests; a concurrent change between them yields an
    /// inconsistent row. An empty detail response gives an empty row.
    pub async fn monitor(&mut self) -> Result<MonitorRow> {
        let stats = self.call(self.ops.monitor, None).await?.into_value();
        if self.detail().await?.is_none() {
            return Ok(MonitorRow::new());
        }

        let metadata = self.metadata.clone().unwrap_or_default();
        Ok(flatten(
            &stats,
            &self.name,
            &metadata,
            &self.created_at(),
            &self.updated_at(),
        ))
    }

    pub fn created_at(&self) -> String {
        timestamp::render(self.created_at)
    }

    pub fn updated_at(&self) -> String {
        timestamp::render(self.updated_at)
    }
}
