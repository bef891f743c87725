use std::sync::Arc;

use rhy_model::AudioMime;
use rhy_model::api::{ChartSummary, SongSummary};

use crate::ClientError;

/// Audio bytes ready to send.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub file_name: String,
    pub mime: AudioMime,
    pub bytes: Arc<[u8]>,
}

/// Result of checking a key with the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid { display_name: Option<String> },
    Invalid,
}

/// Storage service operations used by the recorder.
///
/// Every call is a single request; nothing is retried.
#[allow(async_fn_in_trait)]
pub trait StorageClient: Send + Sync {
    async fn verify_credential(&self, key: &str) -> Result<Verification, ClientError>;

    /// Ask the server for a new key.
    async fn issue_credential(&self) -> Result<String, ClientError>;

    async fn set_display_name(&self, key: &str, name: &str) -> Result<(), ClientError>;

    async fn list_songs(&self) -> Result<Vec<SongSummary>, ClientError>;

    async fn upload_song(&self, key: &str, title: &str, author: &str, file: &AudioFile) -> Result<(), ClientError>;

    /// Store a recording: audio plus chart text.
    async fn save_record(&self, key: &str, title: &str, music: &AudioFile, chart: &str) -> Result<(), ClientError>;

    /// Store chart text against a song already on the server.
    async fn save_chart(&self, key: &str, music_path: &str, chart: &str) -> Result<(), ClientError>;

    async fn list_charts(&self) -> Result<Vec<ChartSummary>, ClientError>;
}
