use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use rhy_model::api::{
    ChartSummary, ErrorBody, IssuedKey, SaveChartRequest, SetNameRequest, SongSummary, VerifyResponse,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::{AudioFile, ClientError, StorageClient, Verification};

const USER_AGENT: &str = concat!("rhy-recorder/", env!("CARGO_PKG_VERSION"));

/// Uploads carry up to 15MB of audio; allow for slow links.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// [`StorageClient`] over the JSON/multipart HTTP API.
#[derive(Debug, Clone)]
pub struct HttpStorageClient {
    client: Client,
    base: Url,
}

impl HttpStorageClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("Invalid server URL: {base_url}"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Invalid server URL: {base_url}");
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Url {
        // `path` is a fixed relative route, so joining cannot fail.
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }
}

/// Map a non-2xx response to a [`ClientError`] using its `{error, code}` body.
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text).ok();
    let message = match &body {
        Some(b) => b.error.clone(),
        None => status.canonical_reason().unwrap_or("Request failed").to_string(),
    };
    debug!(status = status.as_u16(), message = %message, "Request rejected");
    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::CONFLICT => ClientError::Conflict {
            message,
            code: body.and_then(|b| b.code),
        },
        s if s.is_client_error() => ClientError::Rejected(message),
        s => ClientError::Server {
            status: s.as_u16(),
            message,
        },
    })
}

async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let text = check(resp).await?.text().await?;
    serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
}

fn audio_part(file: &AudioFile) -> Result<Part, ClientError> {
    Ok(Part::bytes(file.bytes.to_vec())
        .file_name(file.file_name.clone())
        .mime_str(file.mime.as_str())?)
}

impl StorageClient for HttpStorageClient {
    async fn verify_credential(&self, key: &str) -> Result<Verification, ClientError> {
        let mut url = self.endpoint("api/auth");
        url.query_pairs_mut().append_pair("key", key);
        let resp = self.client.get(url).send().await?;
        match parse::<VerifyResponse>(resp).await {
            Ok(body) if body.success => Ok(Verification::Valid {
                display_name: body.username,
            }),
            Ok(_) | Err(ClientError::Unauthorized(_)) => Ok(Verification::Invalid),
            Err(e) => Err(e),
        }
    }

    async fn issue_credential(&self) -> Result<String, ClientError> {
        let resp = self.client.post(self.endpoint("api/auth")).send().await?;
        let issued: IssuedKey = parse(resp).await?;
        Ok(issued.key)
    }

    async fn set_display_name(&self, key: &str, name: &str) -> Result<(), ClientError> {
        let body = SetNameRequest {
            key: key.to_string(),
            username: name.to_string(),
        };
        let resp = self.client.put(self.endpoint("api/auth")).json(&body).send().await?;
        check(resp).await?;
        Ok(())
    }

    async fn list_songs(&self) -> Result<Vec<SongSummary>, ClientError> {
        let resp = self.client.get(self.endpoint("api/songs")).send().await?;
        parse(resp).await
    }

    async fn upload_song(&self, key: &str, title: &str, author: &str, file: &AudioFile) -> Result<(), ClientError> {
        let form = Form::new()
            .text("key", key.to_string())
            .text("title", title.to_string())
            .text("author", author.to_string())
            .part("file", audio_part(file)?);
        debug!(file = %file.file_name, size = file.bytes.len(), "Uploading song");
        let resp = self.client.post(self.endpoint("api/songs")).multipart(form).send().await?;
        check(resp).await?;
        Ok(())
    }

    async fn save_record(&self, key: &str, title: &str, music: &AudioFile, chart: &str) -> Result<(), ClientError> {
        let form = Form::new()
            .text("key", key.to_string())
            .text("title", title.to_string())
            .text("notes", chart.to_string())
            .part("music", audio_part(music)?);
        debug!(file = %music.file_name, size = music.bytes.len(), "Saving record");
        let resp = self.client.post(self.endpoint("api/records")).multipart(form).send().await?;
        check(resp).await?;
        Ok(())
    }

    async fn save_chart(&self, key: &str, music_path: &str, chart: &str) -> Result<(), ClientError> {
        let body = SaveChartRequest {
            key: key.to_string(),
            music_path: music_path.to_string(),
            note_data: chart.to_string(),
        };
        let resp = self.client.post(self.endpoint("api/charts")).json(&body).send().await?;
        check(resp).await?;
        Ok(())
    }

    async fn list_charts(&self) -> Result<Vec<ChartSummary>, ClientError> {
        let resp = self.client.get(self.endpoint("api/charts")).send().await?;
        parse(resp).await.inspect_err(|e| warn!(error = %e, "Failed to list charts"))
    }
}
