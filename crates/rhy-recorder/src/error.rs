use rhy_audio::ClockError;
use rhy_client::ClientError;
use rhy_model::UploadError;
use thiserror::Error;

/// Why a recorder action did nothing. The message is shown to the user as is.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Select an audio file first")]
    NoMedia,
    #[error("Nothing has been recorded yet")]
    NothingRecorded,
    #[error("Please log in first")]
    NotLoggedIn,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Failed to load audio: {0:#}")]
    Media(#[source] anyhow::Error),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Invalid key")]
    InvalidKey,
    #[error("Clipboard unavailable: {0:#}")]
    Clipboard(#[source] anyhow::Error),
}

impl SessionError {
    /// Whether the user should be prompted to log in again.
    pub fn needs_login(&self) -> bool {
        match self {
            Self::NotLoggedIn | Self::InvalidKey => true,
            Self::Client(e) => e.is_unauthorized(),
            _ => false,
        }
    }
}
