use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rhy_model::AudioMime;
use rhy_model::api::{ChartSummary, IssuedKey, SaveChartRequest, SetNameRequest, SongSummary, SuccessResponse, VerifyResponse};
use rhy_store::{AudioUpload, StorageService, StoreError};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;

/// Shared state passed to all request handlers.
pub type AppState = Arc<StorageService>;

/// Room for multipart framing and text fields on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 256 * 1024;

/// Build the API router.
///
/// | Path | Methods |
/// |------|---------|
/// | `/api/auth` | `POST` issue key, `PUT` set name, `GET ?key=` verify |
/// | `/api/songs` | `GET` list, `POST` multipart upload |
/// | `/api/records` | `POST` multipart record |
/// | `/api/charts` | `GET` list, `POST` JSON chart |
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes() as usize + FORM_OVERHEAD_BYTES;
    Router::new()
        .route("/api/auth", get(verify_key).post(issue_key).put(set_name))
        .route("/api/songs", get(list_songs).post(upload_song))
        .route("/api/records", post(save_record))
        .route("/api/charts", get(list_charts).post(save_chart))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Run a storage call on the blocking pool.
async fn run<T, F>(state: &AppState, fallback: &'static str, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&StorageService) -> Result<T, StoreError> + Send + 'static,
{
    let service = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| ApiError::internal(fallback, e))?
        .map_err(|e| ApiError::store(e, fallback))
}

async fn issue_key(State(state): State<AppState>) -> Result<Json<IssuedKey>, ApiError> {
    let key = run(&state, "Failed to create user", |svc| svc.issue_credential()).await?;
    Ok(Json(IssuedKey { key }))
}

async fn set_name(
    State(state): State<AppState>,
    Json(req): Json<SetNameRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    run(&state, "Failed to update username", move |svc| {
        svc.set_display_name(&req.key, &req.username)
    })
    .await?;
    Ok(Json(SuccessResponse::ok()))
}

#[derive(Debug, Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

async fn verify_key(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Some(key) = query.key.filter(|k| !k.is_empty()) else {
        return Err(ApiError::bad_request("Key is required"));
    };
    let verified = run(&state, "Failed to verify key", move |svc| {
        svc.verify_credential(&key)?.ok_or(StoreError::InvalidKey)
    })
    .await?;
    Ok(Json(VerifyResponse {
        success: true,
        username: verified.username,
    }))
}

async fn list_songs(State(state): State<AppState>) -> Result<Json<Vec<SongSummary>>, ApiError> {
    let songs = run(&state, "Failed to fetch songs", |svc| svc.list_songs()).await?;
    Ok(Json(songs))
}

async fn list_charts(State(state): State<AppState>) -> Result<Json<Vec<ChartSummary>>, ApiError> {
    let charts = run(&state, "Failed to fetch note charts", |svc| svc.list_charts()).await?;
    Ok(Json(charts))
}

async fn save_chart(
    State(state): State<AppState>,
    Json(req): Json<SaveChartRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    run(&state, "Failed to save note chart", move |svc| {
        svc.save_chart(&req.key, &req.music_path, &req.note_data)
    })
    .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Text fields plus at most one file part of a multipart form.
#[derive(Debug, Default)]
struct Form {
    fields: HashMap<String, String>,
    file: Option<AudioUpload>,
}

impl Form {
    async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, ApiError> {
        let mut form = Form::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == file_field {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let mime = match field.content_type() {
                    Some(ct) => ct.to_owned(),
                    None => guess_mime(&file_name),
                };
                let bytes = field.bytes().await?.to_vec();
                debug!(field = %name, file_name = %file_name, mime = %mime, size = bytes.len(), "Received file part");
                form.file = Some(AudioUpload {
                    file_name,
                    mime,
                    bytes,
                });
            } else {
                form.fields.insert(name, field.text().await?);
            }
        }
        Ok(form)
    }

    fn take(&mut self, name: &str) -> String {
        self.fields.remove(name).unwrap_or_default()
    }
}

fn guess_mime(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(AudioMime::from_extension)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

async fn upload_song(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SuccessResponse>, ApiError> {
    let mut form = Form::read(multipart, "file").await?;
    let Some(file) = form.file.take() else {
        return Err(ApiError::bad_request(StoreError::MissingFields.to_string()));
    };
    let (key, title, author) = (form.take("key"), form.take("title"), form.take("author"));
    run(&state, "Failed to upload song", move |svc| {
        svc.upload_song(&key, &title, &author, &file).map(|_| ())
    })
    .await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn save_record(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SuccessResponse>, ApiError> {
    let mut form = Form::read(multipart, "music").await?;
    let Some(music) = form.file.take() else {
        return Err(ApiError::bad_request(StoreError::MissingFields.to_string()));
    };
    let (key, title, notes) = (form.take("key"), form.take("title"), form.take("notes"));
    run(&state, "Failed to save record", move |svc| {
        svc.save_record(&key, &title, &music, &notes)
    })
    .await?;
    Ok(Json(SuccessResponse::ok()))
}
