//! Hetzner Cloud server directory and power actions
//!
//! [`ServerDirectory`] is the seam the command interpreter talks to.
//! [`HetznerClient`] implements it against the Hetzner Cloud REST API:
//!
//! - `GET /servers`
//! - `GET /servers/{id}`
//! - `POST /servers/{id}/actions/{verb}`
//!
//! Actions are fire-and-forget. A successful response only means the API
//! accepted the action; the returned action object is not polled.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::types::{Server, ServerResponse, ServersResponse};
use crate::{Error, Result};

/// Default Hetzner Cloud API endpoint
pub const DEFAULT_API_URL: &str = "https://api.hetzner.cloud/v1";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Servers requested per listing page (API maximum)
const PAGE_SIZE: u32 = 50;

/// Remote power action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerAction {
    PowerOn,
    PowerOff,
    Shutdown,
    Reboot,
}

impl ServerAction {
    /// Verb used in the action URL
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PowerOn => "poweron",
            Self::PowerOff => "poweroff",
            Self::Shutdown => "shutdown",
            Self::Reboot => "reboot",
        }
    }
}

impl fmt::Display for ServerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server lookup and power control
#[async_trait]
pub trait ServerDirectory: Send + Sync {
    /// List all servers
    ///
    /// Fails with [`Error::HttpError`] if the listing cannot be retrieved.
    async fn list_servers(&self) -> Result<Vec<Server>>;

    /// Get a server by ID
    ///
    /// Any non-success response is `Ok(None)`.
    async fn get_server(&self, id: i64) -> Result<Option<Server>>;

    /// Issue a power action
    ///
    /// Returns `false` when the action was rejected or the request failed.
    async fn execute_action(&self, id: i64, action: ServerAction) -> bool;

    /// Find a server by case-insensitive exact name; first match wins
    async fn get_server_by_name(&self, name: &str) -> Result<Option<Server>> {
        let wanted = name.to_lowercase();
        let servers = self.list_servers().await?;
        Ok(servers
            .into_iter()
            .find(|s| s.name.to_lowercase() == wanted))
    }

    async fn power_on(&self, id: i64) -> bool {
        self.execute_action(id, ServerAction::PowerOn).await
    }

    async fn power_off(&self, id: i64) -> bool {
        self.execute_action(id, ServerAction::PowerOff).await
    }

    async fn shutdown(&self, id: i64) -> bool {
        self.execute_action(id, ServerAction::Shutdown).await
    }

    async fn reboot(&self, id: i64) -> bool {
        self.execute_action(id, ServerAction::Reboot).await
    }
}

#[async_trait]
impl<T: ServerDirectory + ?Sized> ServerDirectory for Arc<T> {
    async fn list_servers(&self) -> Result<Vec<Server>> {
        (**self).list_servers().await
    }

    async fn get_server(&self, id: i64) -> Result<Option<Server>> {
        (**self).get_server(id).await
    }

    async fn execute_action(&self, id: i64, action: ServerAction) -> bool {
        (**self).execute_action(id, action).await
    }

    async fn get_server_by_name(&self, name: &str) -> Result<Option<Server>> {
        (**self).get_server_by_name(name).await
    }
}

/// Hetzner Cloud API settings
#[derive(Clone)]
pub struct HetznerConfig {
    pub api_token: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl HetznerConfig {
    /// Settings for the public API with the default timeout
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for HetznerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HetznerConfig")
            .field("api_token", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Hetzner Cloud API client
#[derive(Debug, Clone)]
pub struct HetznerClient {
    client: Client,
    base_url: String,
}

impl HetznerClient {
    /// Create a client; fails if the API token is missing
    pub fn new(config: HetznerConfig) -> Result<Self> {
        let token = config.api_token.trim();
        if token.is_empty() {
            return Err(Error::ConfigError(
                "Hetzner API token not configured".to_string(),
            ));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::ConfigError(format!("Invalid Hetzner API token: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Read a response body and decode it as JSON
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let text = response
        .text()
        .await
        .map_err(|e| Error::HttpError(format!("Failed to read Hetzner response: {}", e)))?;

    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl ServerDirectory for HetznerClient {
    #[instrument(skip(self))]
    async fn list_servers(&self) -> Result<Vec<Server>> {
        let mut servers = Vec::new();
        let mut page = 1;

        loop {
            let response = self
                .client
                .get(self.url("servers"))
                .query(&[("page", page), ("per_page", PAGE_SIZE)])
                .send()
                .await
                .map_err(|e| {
                    error!(error = %e, page, "Failed to get servers from Hetzner");
                    Error::HttpError(format!("Hetzner request failed: {}", e))
                })?;

            let status = response.status();
            if !status.is_success() {
                error!(status = %status, page, "Hetzner returned error status for server list");
                return Err(Error::HttpError(format!("Hetzner error: {}", status)));
            }

            let body: ServersResponse = decode(response).await?;
            let next_page = body.next_page();
            servers.extend(body.servers);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        debug!(count = servers.len(), "Fetched server list");
        Ok(servers)
    }

    #[instrument(skip(self))]
    async fn get_server(&self, id: i64) -> Result<Option<Server>> {
        let response = self
            .client
            .get(self.url(&format!("servers/{}", id)))
            .send()
            .await
            .map_err(|e| {
                error!(server_id = id, error = %e, "Failed to get server from Hetzner");
                Error::HttpError(format!("Hetzner request failed: {}", e))
            })?;

        if !response.status().is_success() {
            debug!(server_id = id, status = %response.status(), "Server lookup returned no match");
            return Ok(None);
        }

        let body: ServerResponse = decode(response).await?;

        Ok(body.server)
    }

    #[instrument(skip(self), fields(action = %action))]
    async fn execute_action(&self, id: i64, action: ServerAction) -> bool {
        let url = self.url(&format!("servers/{}/actions/{}", id, action));

        match self.client.post(&url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(server_id = id, "Action accepted");
                true
            }
            Ok(response) => {
                warn!(
                    server_id = id,
                    status = %response.status(),
                    "Failed to execute action on server"
                );
                false
            }
            Err(e) => {
                error!(server_id = id, error = %e, "Failed to execute action on server");
                false
            }
        }
    }
}
