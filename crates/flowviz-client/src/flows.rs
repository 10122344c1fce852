use flowviz_core::import;
use flowviz_core::selector::{self, Selection};
use flowviz_core::{Flow, FlowEntry};
use serde::Deserialize;

use crate::{ClientError, FlowvizClient, StatusResponse};

/// Answer of `POST /api/validate-json`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RemoteValidation {
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl FlowvizClient {
    /// `GET /api/flows`: built-in examples and user-saved flows.
    pub async fn list_flows(&self) -> Result<Vec<FlowEntry>, ClientError> {
        let response = self.client.get(self.url("/api/flows")).send().await?;
        let flows: Vec<FlowEntry> = Self::parse_response(response).await?;
        tracing::debug!(count = flows.len(), "fetched flow listing");
        Ok(flows)
    }

    /// Fetch a flow document and run it through the same validation as a
    /// local import.
    pub async fn fetch_flow(&self, path: &str) -> Result<Flow, ClientError> {
        let response = self.client.get(self.url(path)).send().await?;
        let text = Self::ensure_success(response).await?.text().await?;
        let flow = import::parse_flow(&text)?;
        tracing::info!(path, blocks = flow.blocks.len(), "fetched flow");
        Ok(flow)
    }

    /// Fetch whatever a selector value points at. `None` means the value
    /// selects local upload and nothing was requested.
    pub async fn fetch_selection(&self, value: &str) -> Result<Option<Flow>, ClientError> {
        match selector::resolve(value) {
            Selection::Upload => Ok(None),
            Selection::Fetch(path) => self.fetch_flow(&path).await.map(Some),
        }
    }

    /// `POST /api/flows` with the whole document.
    pub async fn save_flow(&self, flow: &Flow) -> Result<StatusResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/api/flows"))
            .json(flow)
            .send()
            .await?;
        let ack = Self::confirm(response).await?;
        tracing::info!(title = %flow.title, path = ?ack.path, "flow saved to server");
        Ok(ack)
    }

    /// Ask the server to shape-check a JSON document. A rejection comes back
    /// as `400` with the same body shape, so it is not treated as an error.
    pub async fn validate_remote(&self, document: &serde_json::Value) -> Result<RemoteValidation, ClientError> {
        let response = self
            .client
            .post(self.url("/api/validate-json"))
            .json(document)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            return Ok(response.json::<RemoteValidation>().await?);
        }
        Self::parse_response(response).await
    }
}
