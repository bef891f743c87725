use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rhy_model::api::{CODE_NAME_ALREADY_SET, CODE_USERNAME_TAKEN, ErrorBody};
use rhy_store::StoreError;
use tracing::error;

/// An error response: status plus `{error, code?}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::new(message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Map a storage failure. Server-side failures are logged and reported
    /// with `fallback` instead of their internals.
    pub fn store(err: StoreError, fallback: &str) -> Self {
        match err {
            StoreError::MissingFields
            | StoreError::EmptyUsername
            | StoreError::Upload(_)
            | StoreError::Chart(_) => Self::bad_request(err.to_string()),
            StoreError::InvalidKey => Self::new(StatusCode::UNAUTHORIZED, err.to_string()),
            StoreError::UsernameTaken => Self {
                status: StatusCode::CONFLICT,
                body: ErrorBody::with_code(err.to_string(), CODE_USERNAME_TAKEN),
            },
            StoreError::NameAlreadySet => Self {
                status: StatusCode::CONFLICT,
                body: ErrorBody::with_code(err.to_string(), CODE_NAME_ALREADY_SET),
            },
            StoreError::Internal(e) => {
                error!("{fallback}: {e:#}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, fallback)
            }
        }
    }

    pub fn internal(fallback: &str, err: impl std::fmt::Display) -> Self {
        error!("{fallback}: {err}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, fallback)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            rhy_model::UploadError::TooLarge { size: 0 }.to_string()
        } else {
            err.body_text()
        };
        // Oversized bodies are reported as 400 like the other upload checks.
        let status = if status.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            status
        };
        Self::new(status, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
