use rhy_model::{ChartError, UploadError};
use thiserror::Error;

/// Failures of storage operations, split by what the caller should tell the user.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Username is required")]
    EmptyUsername,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("Invalid note chart: {0}")]
    Chart(#[from] ChartError),
    #[error("Invalid key")]
    InvalidKey,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("A username is already set for this key")]
    NameAlreadySet,
    #[error("storage failure: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    /// Whether the request itself was at fault, as opposed to the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}
