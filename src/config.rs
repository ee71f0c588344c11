//! Configuration Management
//!
//! Handles persistent configuration storage and resolves the effective
//! connection settings (CLI > config file > environment > default).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8888";

/// Request timeout used when nothing else is configured
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Messaging service endpoint, without the API version
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Project (tenant) the requests are scoped to
    #[serde(default)]
    pub project_id: Option<String>,
    /// Stable client identifier sent as `Client-ID`
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Everything a transport needs to reach the service
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub endpoint: String,
    pub project_id: Option<String>,
    pub client_id: String,
    /// Pre-issued token, passed through as `X-Auth-Token`
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl ConnectionSettings {
    /// Settings for `endpoint` with a fresh client id and no project
    pub fn for_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            project_id: None,
            client_id: uuid::Uuid::new_v4().to_string(),
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub auth_token: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("zaqar-pubsub").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective endpoint (CLI > config > environment > default)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.endpoint.clone())
            .or_else(|| env_var("ZAQAR_ENDPOINT"))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Get effective project (CLI > config > environment)
    pub fn effective_project(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.project_id.clone())
            .or_else(|| env_var("OS_PROJECT_ID"))
    }

    /// Get the client id, generating one if none was saved
    pub fn effective_client_id(&self) -> String {
        self.client_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    pub fn effective_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Resolve the settings used to build a transport
    pub fn connection(&self, overrides: &Overrides) -> Result<ConnectionSettings> {
        let endpoint = self.effective_endpoint(overrides.endpoint.as_deref());
        // Fail early on a bad endpoint rather than on the first request
        crate::transport::http::api_root(&endpoint)?;

        Ok(ConnectionSettings {
            endpoint,
            project_id: self.effective_project(overrides.project_id.as_deref()),
            client_id: self.effective_client_id(),
            auth_token: overrides
                .auth_token
                .clone()
                .or_else(|| env_var("OS_AUTH_TOKEN")),
            timeout: self.effective_timeout(),
        })
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
