use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// 401: the key is missing or unknown.
    #[error("{0}")]
    Unauthorized(String),
    /// 409: e.g. a taken display name. `code` is the server's error code.
    #[error("{message}")]
    Conflict { message: String, code: Option<String> },
    /// Any other 4xx.
    #[error("{0}")]
    Rejected(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Conflict { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
