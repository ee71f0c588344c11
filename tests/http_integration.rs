//! Integration tests for the HTTP transport and resource proxies using wiremock
//!
//! These tests run real requests against mocked endpoints and check the
//! wire format: paths, methods, headers, bodies and status handling.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zaqar_pubsub::{
    params, Client, ConnectionSettings, Error, HttpTransport, ListOptions, Provision,
    RemoteResource,
};

fn settings(server: &MockServer) -> ConnectionSettings {
    ConnectionSettings {
        endpoint: server.uri(),
        project_id: Some("test-project".to_string()),
        client_id: "3381af92-2b9e-11e3-b191-71861300734c".to_string(),
        auth_token: Some("test-token".to_string()),
        timeout: Duration::from_secs(5),
    }
}

fn client(server: &MockServer) -> Client<HttpTransport> {
    Client::connect(&settings(server)).expect("Client should build")
}

/// Transport-level behavior
mod transport_tests {
    use super::*;

    /// Every request carries the client id, project and token headers
    #[tokio::test]
    async fn test_identity_headers_are_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/monitors/topics/t1"))
            .and(header("Client-ID", "3381af92-2b9e-11e3-b191-71861300734c"))
            .and(header("X-Project-ID", "test-project"))
            .and(header("X-Auth-Token", "test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"publish": {"published": 1}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .call("topic_get_monitor", &params([("topic_name", json!("t1"))]), None)
            .await
            .expect("Request should succeed");

        assert_eq!(response.status, 200);
        assert_eq!(response.into_value()["publish"]["published"], 1);
    }

    /// A 404 surfaces as ResourceNotFound carrying the request path
    #[tokio::test]
    async fn test_404_becomes_resource_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/topics/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server)
            .call("topic_get", &params([("topic_name", json!("missing"))]), None)
            .await
            .expect_err("404 should fail");

        assert!(matches!(err, Error::ResourceNotFound(ref p) if p == "topics/missing"));
    }

    /// Other error statuses keep the status for a friendly message
    #[tokio::test]
    async fn test_401_is_reported_as_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/topics"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"title": "Unauthorized"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .call("topic_list", &params([]), None)
            .await
            .expect_err("401 should fail");

        assert!(matches!(err, Error::Http { status: 401, .. }));
        assert!(err.user_message().contains("Authentication failed"));
        assert!(err.to_string().contains("Unauthorized"));
    }

    /// Empty 204 answers have no parsed content
    #[tokio::test]
    async fn test_204_has_no_content() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v2/queues/q1/purge"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .call("queue_purge", &params([("queue_name", json!("q1"))]), None)
            .await
            .expect("Purge should succeed");

        assert!(response.deserialized_content.is_none());
        assert!(response.is_empty());
    }

    /// Non-JSON success bodies are rejected
    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/topics/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .call("topic_get", &params([("topic_name", json!("t1"))]), None)
            .await
            .expect_err("HTML is not JSON");

        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}

/// Resource proxies over HTTP
mod proxy_tests {
    use super::*;

    /// Auto-create reads the topic first and creates it on 404
    #[tokio::test]
    async fn test_topic_auto_create() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/topics/orders"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v2/topics/orders"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let topic = client(&server)
            .topic("orders", Provision::AutoCreate)
            .await
            .expect("Topic should be created");

        assert_eq!(topic.name(), "orders");
        assert_eq!(topic.lifecycle(), zaqar_pubsub::resource::Lifecycle::Exists);
    }

    /// Metadata updates are sent as JSON-Patch with the patch media type
    #[tokio::test]
    async fn test_metadata_update_uses_json_patch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/topics/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "topic": {"name": "orders", "metadata": {"ttl": 60, "flag": ""}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/v2/topics/orders"))
            .and(header(
                "Content-Type",
                "application/openstack-messaging-v2.0-json-patch",
            ))
            .and(body_json(json!([
                {"op": "replace", "path": "/metadata/ttl", "value": 120}
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ttl": 120, "flag": ""})))
            .expect(1)
            .mount(&server)
            .await;

        let mut topic = client(&server)
            .topic("orders", Provision::Local)
            .await
            .expect("Local proxy");
        let new = json!({"ttl": 120, "flag": "on", "added": true})
            .as_object()
            .cloned()
            .expect("object");
        let metadata = topic
            .update_metadata(&new)
            .await
            .expect("Update should succeed");

        assert_eq!(metadata["ttl"], 120);
        assert_eq!(metadata["flag"], "");
        assert!(metadata.get("added").is_none());
    }

    /// Listing follows the next link until a page comes back without one
    #[tokio::test]
    async fn test_topic_listing_follows_links() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/topics"))
            .and(query_param("marker", "t2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "topics": [{"name": "t3"}],
                "links": []
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/topics"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "topics": [{"name": "t1"}, {"name": "t2"}],
                "links": [{"rel": "next", "href": "/v2/topics?marker=t2&limit=2"}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let topics = client(&server)
            .topics(&ListOptions {
                limit: Some(2),
                ..Default::default()
            })
            .collect_all()
            .await
            .expect("Listing should succeed");

        let names: Vec<&str> = topics.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["t1", "t2", "t3"]);
    }

    /// Subscribing posts the subscriber, then reads the subscription back
    #[tokio::test]
    async fn test_subscribe() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/topics/orders/subscriptions"))
            .and(body_json(json!({"subscriber": "http://x", "options": {}})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"subscription_id": "s1"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/topics/orders/subscriptions/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "s1",
                "source": "orders",
                "subscriber": "http://x",
                "options": {},
                "confirmed": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let subscription = client(&server)
            .subscribe("orders", "http://x", Default::default())
            .await
            .expect("Subscription should be created");

        assert_eq!(subscription.id(), Some("s1"));
        assert_eq!(subscription.confirmed(), Some(false));
    }

    /// Monitoring a missing queue names the queue
    #[tokio::test]
    async fn test_queue_monitor_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/monitors/queues/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut queue = client(&server)
            .queue("gone", Provision::Local)
            .await
            .expect("Local proxy");
        let err = queue.monitor().await.expect_err("Queue is gone");

        assert_eq!(err.to_string(), "Queue 'gone' does not exist");
    }

    /// Delete by handles passes the handles as a query parameter
    #[tokio::test]
    async fn test_delete_messages_by_handles() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v2/queues/q1/messages"))
            .and(query_param("handles", "h1,h2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "successful": ["h1"],
                "expired": ["h2"],
                "invalid": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let queue = client(&server)
            .queue("q1", Provision::Local)
            .await
            .expect("Local proxy");
        let report = queue
            .delete_by_handles(&["h1".to_string(), "h2".to_string()])
            .await
            .expect("Delete should succeed");

        assert_eq!(report.successful, vec!["h1"]);
        assert_eq!(report.expired, vec!["h2"]);
        assert!(!report.is_complete());
    }
}
