//! Error types
//!
//! Every fallible operation in the library returns [`Result`]. Validation
//! errors are raised before any request leaves the process; transport
//! errors carry the HTTP status so the CLI can describe them.

use crate::operation::ParamType;
use crate::resource::ResourceKind;
use thiserror::Error;

/// Library result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("parameter '{name}' must be {expected}, got {actual}")]
    InvalidParameterType {
        name: String,
        expected: ParamType,
        actual: &'static str,
    },

    #[error("no value for path placeholder '{{{0}}}'")]
    UnresolvedPlaceholder(String),

    /// The server answered 404 for the given request path
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// A proxy-level translation of [`Error::ResourceNotFound`]
    #[error("{kind} '{name}' does not exist")]
    NotFound { kind: ResourceKind, name: String },

    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("malformed response from {operation}: {reason}")]
    MalformedResponse {
        operation: String,
        reason: String,
    },

    #[error("{kind} '{name}' has already been deleted")]
    ResourceAlreadyDeleted { kind: ResourceKind, name: String },

    #[error("{0} name does not have a value")]
    EmptyName(ResourceKind),

    #[error(
        "the {kind} name '{name}' may only contain ASCII letters, digits, underscores and dashes"
    )]
    InvalidName { kind: ResourceKind, name: String },

    /// `message` is the sanitized error body; [`Error::user_message`] hides it
    #[error("API request failed: {status}{}", body_suffix(.message))]
    Http { status: u16, message: String },

    #[error("failed to send request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn malformed(operation: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the remote resource is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound(_) | Self::NotFound { .. })
    }

    /// Short, user-facing description of the failure
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { status, .. } => describe_status(*status).to_string(),
            other => other.to_string(),
        }
    }
}

fn body_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(" - {message}")
    }
}

/// Map an HTTP status onto a message that does not leak API internals
pub fn describe_status(status: u16) -> &'static str {
    match status {
        400 => "Invalid request. Check your parameters.",
        401 => "Authentication failed. Check OS_AUTH_TOKEN or --auth-token.",
        403 => "Permission denied for this project.",
        404 => "Resource not found.",
        409 => "Resource conflict. The resource may already exist or be in use.",
        429 => "Rate limit exceeded. Please try again later.",
        500..=599 => "Messaging service temporarily unavailable. Please try again.",
        _ => "Request failed. Check your network connection and try again.",
    }
}
