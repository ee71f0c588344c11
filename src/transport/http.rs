//! HTTP transport for the messaging REST API

use super::{Response, Transport};
use crate::config::ConnectionSettings;
use crate::error::{Error, Result};
use crate::operation::{Method, Request};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// API version segment appended to the endpoint
const API_VERSION: &str = "v2";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let total = body.chars().count();
    let truncated = if total > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Join the endpoint and the API version into the base URL every path is resolved against
pub fn api_root(endpoint: &str) -> Result<Url> {
    let root = format!("{}/{}/", endpoint.trim_end_matches('/'), API_VERSION);
    Ok(Url::parse(&root)?)
}

/// `reqwest`-backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    client_id: String,
    project_id: Option<String>,
    auth_token: Option<String>,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("zaqar-pubsub/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: api_root(&settings.endpoint)?,
            client_id: settings.client_id.clone(),
            project_id: settings.project_id.clone(),
            auth_token: settings.auth_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of a request, query string included
    pub fn url_for(&self, request: &Request) -> Result<Url> {
        let mut url = self.base_url.join(&request.path)?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let url = self.url_for(&request)?;
        tracing::debug!("{} {} ({})", request.method, url, request.operation);

        let mut builder = self
            .client
            .request(to_reqwest(request.method), url)
            .header("Client-ID", &self.client_id);

        if let Some(project_id) = &self.project_id {
            builder = builder.header("X-Project-ID", project_id);
        }
        if let Some(token) = &self.auth_token {
            builder = builder.header("X-Auth-Token", token);
        }
        if let Some(body) = request.body {
            let content_type = request.content_type.unwrap_or(crate::operation::ContentType::Json);
            builder = builder.header(CONTENT_TYPE, content_type.as_str()).body(body);
        }

        let response = builder.send().await?;

        let status = response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let content = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            tracing::warn!("{}: {} not found", request.operation, request.path);
            return Err(Error::ResourceNotFound(request.path));
        }

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            let message = sanitize_for_log(&content);
            tracing::error!("API error: {} - {}", status, message);
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        Response::from_body(status.as_u16(), headers, content, &request.operation)
    }
}
