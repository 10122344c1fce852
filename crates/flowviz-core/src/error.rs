use crate::import::ImportError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Block with ID \"{0}\" already exists")]
    DuplicateBlock(String),

    #[error("Save cancelled: a flow title is required")]
    SaveCancelled,

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// True for errors caused by user input rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_)
                | CoreError::DuplicateBlock(_)
                | CoreError::SaveCancelled
                | CoreError::Import(_)
        )
    }
}
