use std::sync::Arc;

use rhy_client::{AudioFile, ClientError, HttpStorageClient, StorageClient, Verification};
use rhy_model::AudioMime;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpStorageClient {
    HttpStorageClient::new(&server.uri()).unwrap()
}

fn wav_file() -> AudioFile {
    AudioFile {
        file_name: "take.wav".to_string(),
        mime: AudioMime::Wav,
        bytes: Arc::from(&b"RIFF0000WAVE"[..]),
    }
}

#[tokio::test]
async fn issue_credential_returns_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "key": "0123abcd" })))
        .expect(1)
        .mount(&server)
        .await;

    let key = client(&server).issue_credential().await.unwrap();
    assert_eq!(key, "0123abcd");
}

#[tokio::test]
async fn verify_credential_reports_display_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth"))
        .and(query_param("key", "good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "username": "ann" })))
        .mount(&server)
        .await;

    let result = client(&server).verify_credential("good").await.unwrap();
    assert_eq!(
        result,
        Verification::Valid {
            display_name: Some("ann".to_string())
        }
    );
}

#[tokio::test]
async fn verify_credential_unknown_key_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid key" })))
        .mount(&server)
        .await;

    let result = client(&server).verify_credential("bad").await.unwrap();
    assert_eq!(result, Verification::Invalid);
}

#[tokio::test]
async fn set_display_name_conflict_carries_code() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/auth"))
        .and(body_json(json!({ "key": "k", "username": "ann" })))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "error": "Username already taken", "code": "USERNAME_TAKEN" })),
        )
        .mount(&server)
        .await;

    let err = client(&server).set_display_name("k", "ann").await.unwrap_err();
    assert!(matches!(err, ClientError::Conflict { .. }));
    assert_eq!(err.code(), Some("USERNAME_TAKEN"));
    assert_eq!(err.to_string(), "Username already taken");
}

#[tokio::test]
async fn save_chart_posts_camel_case_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/charts"))
        .and(body_json(json!({
            "key": "k",
            "musicPath": "songs/1-a.ogg",
            "noteData": "1.000000:0:d\n1.500000:1:d",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .save_chart("k", "songs/1-a.ogg", "1.000000:0:d\n1.500000:1:d")
        .await
        .unwrap();
}

#[tokio::test]
async fn save_record_sends_multipart_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/records"))
        .and(body_string_contains("name=\"notes\""))
        .and(body_string_contains("filename=\"take.wav\""))
        .and(body_string_contains("audio/wav"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .save_record("k", "take", &wav_file(), "0.500000:0:d")
        .await
        .unwrap();
}

#[tokio::test]
async fn upload_rejection_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/songs"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "File too large. Maximum size is 15MB." })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_song("k", "t", "a", &wav_file())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rejected(_)));
    assert_eq!(err.to_string(), "File too large. Maximum size is 15MB.");
}

#[tokio::test]
async fn unauthorized_upload_is_flagged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/songs"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid key" })))
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_song("k", "t", "a", &wav_file())
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn server_error_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/songs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).list_songs().await.unwrap_err();
    match err {
        ClientError::Server { status, .. } => assert_eq!(status, 500),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn list_songs_and_charts_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/songs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "title": "Song",
            "author": "Band",
            "file_path": "songs/1-song.ogg",
            "file_size": 1234,
            "uploader": null,
            "created_at": "2024-01-01 00:00:00",
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/charts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client(&server);
    let songs = client.list_songs().await.unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].file_path, "songs/1-song.ogg");
    assert_eq!(songs[0].uploader, None);
    assert!(client.list_charts().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).issue_credential().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}
