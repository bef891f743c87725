use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rhy_audio::{MediaSource, MockTimeProvider, OfflineMediaBackend, wav};
use rhy_client::{AudioFile, ClientError, StorageClient, Verification};
use rhy_model::api::{ChartSummary, SongSummary};
use rhy_model::{AudioMime, KeyMap, UploadError};
use rhy_recorder::submit::{self, Completed, Request};
use rhy_recorder::{SessionContext, SessionController, SessionError};

const TOKEN: &str = "0123456789abcdef0123456789abcdef";

/// Records every call; answers from a fixed script.
#[derive(Default)]
struct MockClient {
    calls: AtomicUsize,
    saved_charts: Mutex<Vec<(String, String)>>,
    reject_name: bool,
}

impl MockClient {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl StorageClient for MockClient {
    async fn verify_credential(&self, key: &str) -> Result<Verification, ClientError> {
        self.hit();
        Ok(if key == TOKEN {
            Verification::Valid {
                display_name: Some("ann".to_string()),
            }
        } else {
            Verification::Invalid
        })
    }

    async fn issue_credential(&self) -> Result<String, ClientError> {
        self.hit();
        Ok(TOKEN.to_string())
    }

    async fn set_display_name(&self, _key: &str, _name: &str) -> Result<(), ClientError> {
        self.hit();
        if self.reject_name {
            return Err(ClientError::Conflict {
                message: "Username already taken".to_string(),
                code: Some("USERNAME_TAKEN".to_string()),
            });
        }
        Ok(())
    }

    async fn list_songs(&self) -> Result<Vec<SongSummary>, ClientError> {
        self.hit();
        Ok(vec![SongSummary {
            id: 1,
            title: "Song".to_string(),
            author: "Band".to_string(),
            file_path: "songs/1-song.ogg".to_string(),
            file_size: 10,
            uploader: None,
            created_at: "2024-01-01 00:00:00".to_string(),
        }])
    }

    async fn upload_song(&self, _key: &str, _title: &str, _author: &str, _file: &AudioFile) -> Result<(), ClientError> {
        self.hit();
        Ok(())
    }

    async fn save_record(&self, _key: &str, _title: &str, _music: &AudioFile, _chart: &str) -> Result<(), ClientError> {
        self.hit();
        Ok(())
    }

    async fn save_chart(&self, _key: &str, music_path: &str, chart: &str) -> Result<(), ClientError> {
        self.hit();
        self.saved_charts
            .lock()
            .unwrap()
            .push((music_path.to_string(), chart.to_string()));
        Ok(())
    }

    async fn list_charts(&self) -> Result<Vec<ChartSummary>, ClientError> {
        self.hit();
        Ok(Vec::new())
    }
}

type Session = SessionController<OfflineMediaBackend<MockTimeProvider>>;

fn session(context: SessionContext) -> (Session, MockTimeProvider) {
    let time = MockTimeProvider::new();
    let backend = OfflineMediaBackend::new(time.clone());
    (SessionController::new(backend, KeyMap::default(), context), time)
}

fn logged_in() -> SessionContext {
    let mut ctx = SessionContext::default();
    ctx.log_in(TOKEN.to_string(), None);
    ctx
}

fn track() -> MediaSource {
    MediaSource::new("track.wav", Some(AudioMime::Wav), wav::silence(10.0, 8000))
}

/// Validate then send, the way the front end does.
async fn run(client: &MockClient, request: Result<Request, SessionError>) -> Result<Completed, SessionError> {
    submit::execute(client, request?).await
}

#[tokio::test]
async fn disallowed_mime_never_reaches_the_network() {
    let client = MockClient::default();
    let (s, _) = session(logged_in());
    let file = MediaSource::new("cover.png", None, vec![1u8; 64]);

    let err = run(&client, s.upload_song("t", "a", &file)).await.unwrap_err();
    assert!(matches!(err, SessionError::Upload(UploadError::InvalidType { .. })));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn logged_out_submission_never_reaches_the_network() {
    let client = MockClient::default();
    let (s, _) = session(SessionContext::default());

    let err = run(&client, s.submit_chart("songs/1-song.ogg")).await.unwrap_err();
    assert!(err.needs_login());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn recorded_chart_is_submitted_once() {
    let client = MockClient::default();
    let (mut s, time) = session(logged_in());
    s.select_media(track()).unwrap();
    s.play().unwrap();
    time.advance_secs(1.0);
    s.key_down("d");
    time.advance_secs(0.5);
    s.key_up("d");

    let completed = run(&client, s.submit_chart("songs/1-song.ogg")).await.unwrap();
    assert_eq!(completed, Completed::ChartSubmitted);
    assert_eq!(client.calls(), 1);
    assert_eq!(
        client.saved_charts.lock().unwrap().as_slice(),
        &[(
            "songs/1-song.ogg".to_string(),
            "1.000000:0:d\n1.500000:1:d".to_string()
        )]
    );
}

#[tokio::test]
async fn login_flow_updates_context() {
    let client = MockClient::default();
    let (mut s, _) = session(SessionContext::default());

    let err = run(&client, s.login("ffffffffffffffffffffffffffffffff")).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidKey));
    assert!(!s.context().is_logged_in());

    let completed = run(&client, s.login(&format!(" {TOKEN} "))).await.unwrap();
    s.apply(&completed);
    assert_eq!(s.context().token.as_deref(), Some(TOKEN));
    assert_eq!(s.context().display_name.as_deref(), Some("ann"));
}

#[tokio::test]
async fn generated_key_logs_in_without_name() {
    let client = MockClient::default();
    let (mut s, _) = session(SessionContext::default());
    let completed = submit::execute(&client, s.generate_key()).await.unwrap();
    s.apply(&completed);
    assert!(s.context().is_logged_in());
    assert_eq!(s.context().display_name, None);
}

#[tokio::test]
async fn rejected_name_leaves_context_unchanged() {
    let client = MockClient {
        reject_name: true,
        ..Default::default()
    };
    let (s, _) = session(logged_in());
    let err = run(&client, s.set_display_name("ann")).await.unwrap_err();
    match &err {
        SessionError::Client(e) => assert_eq!(e.code(), Some("USERNAME_TAKEN")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "Username already taken");
    assert_eq!(s.context().display_name, None);
}

#[tokio::test]
async fn refresh_songs_stores_list() {
    let client = MockClient::default();
    let (mut s, _) = session(SessionContext::default());
    let completed = submit::execute(&client, s.refresh_songs()).await.unwrap();
    s.apply(&completed);
    assert_eq!(s.context().songs.len(), 1);
    assert_eq!(s.context().songs[0].file_path, "songs/1-song.ogg");
}

#[test]
fn restart_then_reset_leaves_empty_session_at_zero() {
    let (mut s, time) = session(SessionContext::default());
    s.select_media(track()).unwrap();
    s.play().unwrap();
    time.advance_secs(4.0);
    s.key_down("f");
    s.tick();

    s.re_record().unwrap();
    assert!(s.events().is_empty());
    assert_eq!(s.clock().current_time(), 0.0);
}
