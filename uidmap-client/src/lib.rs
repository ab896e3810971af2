//! uidmap HTTP Client
//!
//! A type-safe HTTP client for the uidmap console backend.
//!
//! The CLI uses it both to drive jobs (submit batches, stop them) and to
//! observe them (progress, activity log, connection status).
//!
//! # Example
//!
//! ```no_run
//! use uidmap_client::ConsoleClient;
//! use uidmap_core::dto::mapping::BulkMappingRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ConsoleClient::new("http://localhost:8000");
//!
//!     let submitted = client.bulk_mapping(&BulkMappingRequest {
//!         count: 100,
//!         user_prefix: "corp\\user".to_string(),
//!         base_ip: "10.0.0.1".to_string(),
//!         timeout: 3600,
//!         operation: Default::default(),
//!         uia_url: None,
//!     }).await?;
//!
//!     println!("Started job {} ({} items)", submitted.job_id, submitted.total);
//!     Ok(())
//! }
//! ```

mod connection;
mod control;
pub mod error;
mod mapping;
mod tags;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// HTTP client for the console backend API
///
/// Methods are grouped by concern:
/// - Mapping and tag submissions
/// - Job control and observation (stop, progress, logs)
/// - Agent connection (verification, certificate status)
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    /// Base URL of the server (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

/// Error body returned by the server
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ConsoleClient {
    /// Create a new console client
    ///
    /// # Example
    /// ```
    /// use uidmap_client::ConsoleClient;
    ///
    /// let client = ConsoleClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new console client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Failed requests carry the server's `{"error": ...}` message when the
    /// body has one, the raw body otherwise.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorBody>(&error_text)
                .map(|body| body.error)
                .unwrap_or(error_text);
            tracing::debug!("Request failed with {}: {}", status, message);
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
