//! Network side of the recorder actions.
//!
//! A [`Request`] is built (and validated) on the UI thread by the session
//! controller, executed here once against a [`StorageClient`], and the
//! [`Completed`] result is applied back on the UI thread. Nothing is retried.

use rhy_client::{AudioFile, StorageClient, Verification};
use rhy_model::api::SongSummary;
use tracing::{info, warn};

use crate::SessionError;

/// A validated action ready to send.
#[derive(Debug, Clone)]
pub enum Request {
    SubmitChart {
        token: String,
        music_path: String,
        chart: String,
    },
    SaveRecord {
        token: String,
        title: String,
        music: AudioFile,
        chart: String,
    },
    UploadSong {
        token: String,
        title: String,
        author: String,
        file: AudioFile,
    },
    Login {
        token: String,
    },
    GenerateKey,
    SetDisplayName {
        token: String,
        name: String,
    },
    RefreshSongs,
}

impl Request {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SubmitChart { .. } => "submit chart",
            Self::SaveRecord { .. } => "save record",
            Self::UploadSong { .. } => "upload song",
            Self::Login { .. } => "log in",
            Self::GenerateKey => "generate key",
            Self::SetDisplayName { .. } => "set display name",
            Self::RefreshSongs => "refresh songs",
        }
    }
}

/// What a successful request changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completed {
    ChartSubmitted,
    RecordSaved,
    SongUploaded,
    LoggedIn {
        token: String,
        display_name: Option<String>,
    },
    DisplayNameSet {
        name: String,
    },
    Songs(Vec<SongSummary>),
}

impl Completed {
    pub fn message(&self) -> String {
        match self {
            Self::ChartSubmitted => "Chart saved".to_string(),
            Self::RecordSaved => "Record saved".to_string(),
            Self::SongUploaded => "Song uploaded".to_string(),
            Self::LoggedIn {
                display_name: Some(name),
                ..
            } => format!("Logged in as {name}"),
            Self::LoggedIn { .. } => "Logged in".to_string(),
            Self::DisplayNameSet { name } => format!("Display name set to {name}"),
            Self::Songs(songs) => format!("{} songs", songs.len()),
        }
    }
}

/// Send one request.
pub async fn execute<C: StorageClient>(client: &C, request: Request) -> Result<Completed, SessionError> {
    let label = request.label();
    let result = match request {
        Request::SubmitChart {
            token,
            music_path,
            chart,
        } => client
            .save_chart(&token, &music_path, &chart)
            .await
            .map(|()| Completed::ChartSubmitted)
            .map_err(SessionError::from),
        Request::SaveRecord {
            token,
            title,
            music,
            chart,
        } => client
            .save_record(&token, &title, &music, &chart)
            .await
            .map(|()| Completed::RecordSaved)
            .map_err(SessionError::from),
        Request::UploadSong {
            token,
            title,
            author,
            file,
        } => client
            .upload_song(&token, &title, &author, &file)
            .await
            .map(|()| Completed::SongUploaded)
            .map_err(SessionError::from),
        Request::Login { token } => match client.verify_credential(&token).await {
            Ok(Verification::Valid { display_name }) => Ok(Completed::LoggedIn { token, display_name }),
            Ok(Verification::Invalid) => Err(SessionError::InvalidKey),
            Err(e) => Err(e.into()),
        },
        Request::GenerateKey => client
            .issue_credential()
            .await
            .map(|token| Completed::LoggedIn {
                token,
                display_name: None,
            })
            .map_err(SessionError::from),
        Request::SetDisplayName { token, name } => client
            .set_display_name(&token, &name)
            .await
            .map(|()| Completed::DisplayNameSet { name })
            .map_err(SessionError::from),
        Request::RefreshSongs => client
            .list_songs()
            .await
            .map(Completed::Songs)
            .map_err(SessionError::from),
    };
    match &result {
        Ok(_) => info!(action = label, "Request completed"),
        Err(e) => warn!(action = label, "Request failed: {e}"),
    }
    result
}
