//! JSON bodies exchanged between the recorder and the storage server.

use serde::{Deserialize, Serialize};

/// Error code sent with 409 when a display name is already used by someone.
pub const CODE_USERNAME_TAKEN: &str = "USERNAME_TAKEN";
/// Error code sent with 409 when the credential already has a display name.
pub const CODE_NAME_ALREADY_SET: &str = "NAME_ALREADY_SET";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedKey {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNameRequest {
    pub key: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }

    pub fn with_code(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChartRequest {
    pub key: String,
    /// Object path (or other reference) of the song the chart belongs to.
    pub music_path: String,
    pub note_data: String,
}

/// A stored song as listed by `GET /api/songs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub file_path: String,
    pub file_size: u64,
    /// Display name of the uploader, if they set one.
    #[serde(default)]
    pub uploader: Option<String>,
    pub created_at: String,
}

/// A stored chart as listed by `GET /api/charts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSummary {
    pub id: i64,
    pub music_path: String,
    pub note_data: String,
    #[serde(default)]
    pub username: Option<String>,
    pub created_at: String,
}
