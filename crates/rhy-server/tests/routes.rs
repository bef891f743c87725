use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use rhy_model::api::{ChartSummary, IssuedKey, SongSummary};
use rhy_server::router;
use rhy_store::{Database, MemoryObjectStore, ObjectStore, StorageService};
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "rhy-test-boundary";
const CHART: &str = "1.000000:0:d\n2.500000:1:d";

fn app() -> (Router, Arc<MemoryObjectStore>) {
    let objects = Arc::new(MemoryObjectStore::new());
    let service = StorageService::new(Database::open_in_memory().unwrap(), objects.clone());
    (router(Arc::new(service)), objects)
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        mime: &'a str,
        bytes: &'a [u8],
    },
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
                );
            }
            Part::File {
                name,
                file_name,
                mime,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart(parts)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn issue(app: &Router) -> String {
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value::<IssuedKey>(body).unwrap().key
}

#[tokio::test]
async fn issue_returns_only_the_key() {
    let (app, _) = app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let obj = body.as_object().unwrap();
    assert_eq!(obj.len(), 1);
    assert_eq!(obj["key"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn verify_key_flow() {
    let (app, _) = app();
    let key = issue(&app).await;

    let (status, body) = send(&app, get(&format!("/api/auth?key={key}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "username": null}));

    let (status, body) = send(&app, get("/api/auth")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Key is required");

    let (status, _) = send(&app, get("/api/auth?key=00000000000000000000000000000000")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn set_username_conflicts() {
    let (app, _) = app();
    let alice = issue(&app).await;
    let bob = issue(&app).await;

    let (status, body) = send(&app, json_request("PUT", "/api/auth", json!({"key": alice, "username": "alice"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, body) = send(&app, json_request("PUT", "/api/auth", json!({"key": bob, "username": "alice"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "USERNAME_TAKEN");

    let (status, body) = send(&app, json_request("PUT", "/api/auth", json!({"key": alice, "username": "other"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NAME_ALREADY_SET");

    let (status, _) = send(&app, json_request("PUT", "/api/auth", json!({"key": bob, "username": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, json_request("PUT", "/api/auth", json!({"key": "nope", "username": "carol"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(&app, get(&format!("/api/auth?key={alice}"))).await;
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn upload_and_list_songs() {
    let (app, objects) = app();
    let key = issue(&app).await;

    let req = multipart_request(
        "/api/songs",
        &[
            Part::Text("key", &key),
            Part::Text("title", "Loop"),
            Part::Text("author", "Me"),
            Part::File {
                name: "file",
                file_name: "loop.ogg",
                mime: "audio/ogg",
                bytes: b"OggS-data",
            },
        ],
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(objects.len(), 1);

    let (status, body) = send(&app, get("/api/songs")).await;
    assert_eq!(status, StatusCode::OK);
    let songs: Vec<SongSummary> = serde_json::from_value(body).unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].title, "Loop");
    assert_eq!(songs[0].file_size, 9);
    assert!(songs[0].file_path.starts_with("songs/"));
}

#[tokio::test]
async fn upload_rejects_bad_type_before_auth() {
    let (app, objects) = app();
    let req = multipart_request(
        "/api/songs",
        &[
            Part::Text("key", "bogus"),
            Part::Text("title", "Clip"),
            Part::Text("author", "Me"),
            Part::File {
                name: "file",
                file_name: "clip.flac",
                mime: "audio/flac",
                bytes: b"fLaC",
            },
        ],
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid file type. Only WAV, OGG, and MP3 are allowed.");
    assert!(objects.is_empty());
}

#[tokio::test]
async fn upload_missing_fields() {
    let (app, _) = app();
    let key = issue(&app).await;
    let req = multipart_request("/api/songs", &[Part::Text("key", &key), Part::Text("title", "T")]);
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn upload_with_invalid_key_is_unauthorized() {
    let (app, objects) = app();
    let req = multipart_request(
        "/api/songs",
        &[
            Part::Text("key", "bogus"),
            Part::Text("title", "T"),
            Part::Text("author", "A"),
            Part::File {
                name: "file",
                file_name: "a.wav",
                mime: "audio/wav",
                bytes: b"RIFF",
            },
        ],
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid key");
    assert!(objects.is_empty());
}

#[tokio::test]
async fn save_record_stores_music_and_notes() {
    let (app, objects) = app();
    let key = issue(&app).await;
    let req = multipart_request(
        "/api/records",
        &[
            Part::Text("key", &key),
            Part::Text("title", "Take 1"),
            Part::File {
                name: "music",
                file_name: "take.mp3",
                mime: "audio/mpeg",
                bytes: b"ID3....",
            },
            Part::Text("notes", CHART),
        ],
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let keys = objects.keys();
    assert_eq!(keys.len(), 2);
    let notes_key = keys.iter().find(|k| k.starts_with("notes/")).unwrap();
    assert_eq!(objects.get(notes_key).unwrap().unwrap(), CHART.as_bytes());
}

#[tokio::test]
async fn save_record_rejects_malformed_chart() {
    let (app, objects) = app();
    let key = issue(&app).await;
    let req = multipart_request(
        "/api/records",
        &[
            Part::Text("key", &key),
            Part::Text("title", "Take 1"),
            Part::File {
                name: "music",
                file_name: "take.wav",
                mime: "audio/wav",
                bytes: b"RIFF",
            },
            Part::Text("notes", "abc:0:d"),
        ],
    );
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(objects.is_empty());
}

#[tokio::test]
async fn charts_round_trip() {
    let (app, _) = app();
    let key = issue(&app).await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/charts",
            json!({"key": key, "musicPath": "songs/1-a.ogg", "noteData": CHART}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/charts",
            json!({"key": "bogus", "musicPath": "songs/1-a.ogg", "noteData": CHART}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, get("/api/charts")).await;
    assert_eq!(status, StatusCode::OK);
    let charts: Vec<ChartSummary> = serde_json::from_value(body).unwrap();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].music_path, "songs/1-a.ogg");
    assert_eq!(charts[0].note_data, CHART);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let objects = Arc::new(MemoryObjectStore::new());
    let service = StorageService::new(Database::open_in_memory().unwrap(), objects.clone())
        .with_max_upload_bytes(16);
    let app = router(Arc::new(service));
    let key = issue(&app).await;

    let big = vec![0u8; 64];
    let req = multipart_request(
        "/api/songs",
        &[
            Part::Text("key", &key),
            Part::Text("title", "T"),
            Part::Text("author", "A"),
            Part::File {
                name: "file",
                file_name: "a.wav",
                mime: "audio/wav",
                bytes: &big,
            },
        ],
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File too large. Maximum size is 15MB.");
    assert!(!objects.exists("songs").unwrap());
    assert!(objects.is_empty());
}
