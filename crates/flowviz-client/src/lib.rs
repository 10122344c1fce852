//! Async client for the Flowviz REST API: the flow store (`/api/flows`,
//! example and user flow documents) and the simulator's file-block
//! endpoints (`/api/blocks`, theme, reset).

mod blocks;
mod error;
mod flows;
mod sequence;

use std::time::Duration;

use flowviz_core::Settings;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use error::ClientError;
pub use flows::RemoteValidation;
pub use sequence::{LoadSequencer, LoadTicket};

/// `{status, ...}` acknowledgement returned by mutating endpoints. The flow
/// store answers `{success: true, ...}` instead; both are accepted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl StatusResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success") || self.success == Some(true)
    }

    fn into_confirmed(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Rejected {
                status: self.status.unwrap_or_else(|| "missing".to_string()),
            })
        }
    }
}

/// HTTP client bound to one Flowviz server.
#[derive(Debug, Clone)]
pub struct FlowvizClient {
    client: reqwest::Client,
    base_url: String,
}

impl FlowvizClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Build a client from settings, applying the request timeout.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, settings.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a server path; relative and rooted paths both resolve
    /// against the base URL.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Parse a status acknowledgement and require it to report success.
    async fn confirm(response: reqwest::Response) -> Result<StatusResponse, ClientError> {
        Self::parse_response::<StatusResponse>(response)
            .await?
            .into_confirmed()
    }
}
