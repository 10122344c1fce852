use flowviz_core::import::ImportError;

/// Errors from the flow store and file-block API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (connect, timeout, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// 2xx response whose body did not report success.
    #[error("server did not confirm the operation (status: {status})")]
    Rejected { status: String },

    /// A fetched flow document failed validation.
    #[error("invalid flow document: {0}")]
    Invalid(#[from] ImportError),

    #[error("file block {0} not found")]
    NotFound(i64),
}

impl ClientError {
    /// Whether the failure happened before any response arrived.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Request(e) if e.is_connect() || e.is_timeout())
    }
}
