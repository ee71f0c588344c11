//! Marker-based paging over list operations
//!
//! List responses carry a `links` array; the `next` link holds the query
//! for the following page (`marker`, `limit`, ...). Paging stops on an
//! empty page, a page without a `next` link, or a marker that did not move.

use crate::client::Client;
use crate::error::{Error, Result};
use crate::operation::{Params, ParamType};
use crate::transport::Transport;
use futures::stream::{self, Stream, TryStreamExt};
use serde_json::Value;
use std::marker::PhantomData;
use url::Url;

/// Options shared by the queue, topic and subscription listings
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub marker: Option<String>,
    pub limit: Option<u64>,
    /// Ask the server to include metadata in each item
    pub detailed: bool,
}

impl ListOptions {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        if let Some(marker) = &self.marker {
            params.insert("marker".to_string(), Value::String(marker.clone()));
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), Value::from(limit));
        }
        if self.detailed {
            params.insert("detailed".to_string(), Value::Bool(true));
        }
        params
    }
}

/// Something that can be built from one item of a list response
pub trait FromListing<T>: Sized {
    /// Key of the item array in the list response
    const KEY: &'static str;

    fn from_listing(client: &Client<T>, item: &Value) -> Result<Self>;
}

/// Lazily walks the pages of a list operation
pub struct Pager<T, R> {
    client: Client<T>,
    operation: &'static str,
    params: Params,
    done: bool,
    _item: PhantomData<fn() -> R>,
}

impl<T: Transport, R: FromListing<T>> Pager<T, R> {
    pub(crate) fn new(client: Client<T>, operation: &'static str, params: Params) -> Self {
        Self {
            client,
            operation,
            params,
            done: false,
            _item: PhantomData,
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Fetch the next page; `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<R>>> {
        if self.done {
            return Ok(None);
        }

        let body = self
            .client
            .call(self.operation, &self.params, None)
            .await?
            .into_value();

        let items = match body.get(R::KEY) {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => {
                return Err(Error::malformed(
                    self.operation,
                    format!("'{}' is not an array", R::KEY),
                ))
            },
        };

        if items.is_empty() {
            self.done = true;
            return Ok(None);
        }

        let page = items
            .iter()
            .map(|item| R::from_listing(&self.client, item))
            .collect::<Result<Vec<_>>>()?;

        self.advance(&body)?;
        tracing::debug!(
            "{}: fetched {} item(s), more={}",
            self.operation,
            page.len(),
            !self.done
        );
        Ok(Some(page))
    }

    /// Follow every page and return all items
    pub async fn collect_all(mut self) -> Result<Vec<R>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }

    /// Item-by-item stream over every page
    pub fn into_stream(self) -> impl Stream<Item = Result<R>> {
        stream::try_unfold(self, |mut pager| async move {
            Ok::<_, Error>(pager.next_page().await?.map(|page| (page, pager)))
        })
        .map_ok(|page| stream::iter(page.into_iter().map(Ok)))
        .try_flatten()
    }

    /// Replace the paging parameters with the ones from the `next` link
    fn advance(&mut self, body: &Value) -> Result<()> {
        let Some(href) = next_link(body) else {
            self.done = true;
            return Ok(());
        };

        let next = self.query_params(href)?;
        let moved = match next.get("marker") {
            Some(marker) => Some(marker) != self.params.get("marker"),
            None => false,
        };

        if moved {
            self.params.extend(next);
        } else {
            self.done = true;
        }
        Ok(())
    }

    /// Query of `href`, typed according to the operation's parameter schema
    fn query_params(&self, href: &str) -> Result<Params> {
        let descriptor = self.client.registry().lookup(self.operation)?;
        let base = Url::parse("http://localhost/")?;
        let url = base.join(href)?;

        Ok(url
            .query_pairs()
            .map(|(key, raw)| {
                let value = coerce(descriptor.param_type(&key), &raw);
                (key.into_owned(), value)
            })
            .collect())
    }
}

fn next_link(body: &Value) -> Option<&str> {
    body.get("links")?
        .as_array()?
        .iter()
        .find(|link| link.get("rel").and_then(Value::as_str) == Some("next"))?
        .get("href")
        .and_then(Value::as_str)
}

fn coerce(kind: Option<ParamType>, raw: &str) -> Value {
    match kind {
        Some(ParamType::Integer) => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(ParamType::Boolean) => match raw {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{RemoteResource, Topic};
    use crate::transport::testing::RecordingTransport;
    use futures::StreamExt;
    use serde_json::json;

    fn page(names: &[&str], next: Option<&str>) -> Value {
        let topics: Vec<Value> = names.iter().map(|n| json!({"name": n})).collect();
        let links: Vec<Value> = next
            .map(|href| vec![json!({"rel": "next", "href": href})])
            .unwrap_or_default();
        json!({"topics": topics, "links": links})
    }

    #[test]
    fn test_list_options_params() {
        let params = ListOptions {
            marker: Some("t5".to_string()),
            limit: Some(10),
            detailed: true,
        }
        .to_params();
        assert_eq!(params["marker"], "t5");
        assert_eq!(params["limit"], 10);
        assert_eq!(params["detailed"], true);
        assert!(ListOptions::default().to_params().is_empty());
    }

    #[test]
    fn test_coerce_follows_schema() {
        assert_eq!(coerce(Some(ParamType::Integer), "20"), json!(20));
        assert_eq!(coerce(Some(ParamType::Boolean), "true"), json!(true));
        assert_eq!(coerce(Some(ParamType::String), "20"), json!("20"));
        assert_eq!(coerce(None, "x"), json!("x"));
    }

    #[tokio::test]
    async fn test_follows_next_links() {
        let client = Client::new(RecordingTransport::new());
        client
            .transport()
            .respond(200, page(&["t1", "t2"], Some("/v2/topics?marker=t2&limit=2")))
            .respond(200, page(&["t3"], Some("/v2/topics?marker=t3&limit=2")))
            .respond(200, page(&[], None));

        let topics = client.topics(&ListOptions::default()).collect_all().await.unwrap();
        let names: Vec<&str> = topics.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["t1", "t2", "t3"]);

        let sent = client.transport().sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].query_param("marker"), None);
        assert_eq!(sent[1].query_param("marker"), Some("t2"));
        assert_eq!(sent[1].query_param("limit"), Some("2"));
        assert_eq!(sent[2].query_param("marker"), Some("t3"));
    }

    #[tokio::test]
    async fn test_stops_without_next_link() {
        let client = Client::new(RecordingTransport::new());
        client.transport().respond(200, page(&["t1"], None));

        let topics = client.topics(&ListOptions::default()).collect_all().await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(client.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_stops_when_marker_repeats() {
        let client = Client::new(RecordingTransport::new());
        client
            .transport()
            .respond(200, page(&["t1"], Some("/v2/topics?marker=t1")))
            .respond(200, page(&["t1"], Some("/v2/topics?marker=t1")));

        let topics = client.topics(&ListOptions::default()).collect_all().await.unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(client.transport().sent().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let client = Client::new(RecordingTransport::new());
        let mut pager = client.topics(&ListOptions::default());
        assert!(pager.next_page().await.unwrap().is_none());
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(client.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_listed_items_exist() {
        let client = Client::new(RecordingTransport::new());
        client.transport().respond(
            200,
            json!({"topics": [{"name": "t1", "metadata": {"ttl": 5}}]}),
        );

        let topics: Vec<Topic<_>> = client
            .topics(&ListOptions { detailed: true, ..Default::default() })
            .collect_all()
            .await
            .unwrap();
        assert_eq!(topics[0].lifecycle(), crate::resource::Lifecycle::Exists);
        assert_eq!(topics[0].cached_metadata().unwrap()["ttl"], 5);
        assert_eq!(client.transport().sent()[0].query_param("detailed"), Some("true"));
    }

    #[tokio::test]
    async fn test_stream_yields_items_across_pages() {
        let client = Client::new(RecordingTransport::new());
        client
            .transport()
            .respond(200, page(&["t1"], Some("/v2/topics?marker=t1")))
            .respond(200, page(&["t2"], None));

        let names: Vec<String> = client
            .topics(&ListOptions::default())
            .into_stream()
            .map(|topic| topic.unwrap().name().to_string())
            .collect()
            .await;
        assert_eq!(names, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_non_array_items_are_malformed() {
        let client = Client::new(RecordingTransport::new());
        client.transport().respond(200, json!({"topics": "nope"}));
        let mut pager = client.topics(&ListOptions::default());
        let err = pager.next_page().await.err().unwrap();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}
