//! FlowMancer HTTP Client
//!
//! A type-safe HTTP client for the FlowMancer server API, used by the CLI
//! and by anything else that wants to trigger workflows remotely.
//!
//! # Example
//!
//! ```no_run
//! use flowmancer_client::FlowmancerClient;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = FlowmancerClient::new("http://localhost:8000");
//!
//!     let record = client
//!         .trigger("lead_qualification", json!({"name": "Ada", "email": "ada@example.com"}))
//!         .await?;
//!     let done = client
//!         .wait_for_execution(record.id, Duration::from_millis(500), Duration::from_secs(60))
//!         .await?;
//!
//!     println!("{} finished: {}", done.id, done.status);
//!     Ok(())
//! }
//! ```

pub mod error;
mod executions;
mod workflows;

pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the FlowMancer API
///
/// Methods are grouped by resource:
/// - Workflow definitions (create, list, get, update, delete)
/// - Executions (trigger, batch trigger, get, list, wait)
/// - Health
#[derive(Debug, Clone)]
pub struct FlowmancerClient {
    /// Base URL of the server (e.g., "http://localhost:8000")
    base_url: String,
    client: Client,
}

impl FlowmancerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client around a configured reqwest Client (timeouts, proxies, TLS)
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /health
    pub async fn health(&self) -> Result<serde_json::Value> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_body(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_body(status.as_u16(), &body));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = FlowmancerClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_with_custom_client() {
        let client = FlowmancerClient::with_client("http://localhost:8000", Client::new());
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
