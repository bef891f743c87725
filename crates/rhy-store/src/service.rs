use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use rhy_model::api::{ChartSummary, SongSummary};
use rhy_model::{MAX_UPLOAD_BYTES, UploadError, deserialize, validate_upload};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{Database, NewRecord, NewSong, SetUsername};
use crate::{ObjectStore, StoreError, credentials};

type Result<T> = std::result::Result<T, StoreError>;

/// An audio file received from a client.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    /// MIME type as declared by the client.
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// A key that matched a stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub lookup_key: String,
    pub username: Option<String>,
}

/// Keep only the final path component of a client-supplied file name.
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '\\')
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Users, songs, records and charts over a database and an object store.
///
/// Multi-object submissions are all-or-nothing: objects already written are
/// deleted again if a later step fails.
pub struct StorageService {
    db: Mutex<Database>,
    objects: Arc<dyn ObjectStore>,
    max_upload_bytes: u64,
}

impl StorageService {
    pub fn new(db: Database, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            db: Mutex::new(db),
            objects,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Lower the upload ceiling. Values above the protocol limit are ignored.
    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max.min(MAX_UPLOAD_BYTES);
        self
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    /// Create a new user and return the key. Only the hashes are stored.
    pub fn issue_credential(&self) -> Result<String> {
        let key = credentials::generate_key();
        let salt = credentials::generate_salt();
        let hash = credentials::key_hash(&salt, &key)?;
        let lookup = credentials::lookup_key(&key);
        self.db
            .lock()
            .insert_user(&lookup, &hash, &salt)
            .context("Failed to create user")?;
        info!("Issued new credential");
        Ok(key)
    }

    /// Look up a key. `Ok(None)` means the key is unknown.
    pub fn verify_credential(&self, key: &str) -> Result<Option<Verified>> {
        if !credentials::is_well_formed(key) {
            return Ok(None);
        }
        let lookup = credentials::lookup_key(key);
        let Some(user) = self.db.lock().find_user(&lookup)? else {
            return Ok(None);
        };
        if !credentials::verify(&user.salt, key, &user.key_hash)? {
            warn!("Credential lookup matched but MAC check failed");
            return Ok(None);
        }
        Ok(Some(Verified {
            lookup_key: user.lookup_key,
            username: user.username,
        }))
    }

    fn authenticate(&self, key: &str) -> Result<Verified> {
        self.verify_credential(key)?.ok_or(StoreError::InvalidKey)
    }

    pub fn set_display_name(&self, key: &str, username: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::EmptyUsername);
        }
        let user = self.authenticate(key)?;
        match self.db.lock().set_username(&user.lookup_key, username)? {
            SetUsername::Updated => {
                info!(username, "Display name set");
                Ok(())
            }
            SetUsername::Taken => Err(StoreError::UsernameTaken),
            SetUsername::AlreadySet => Err(StoreError::NameAlreadySet),
            SetUsername::UnknownUser => Err(StoreError::InvalidKey),
        }
    }

    pub fn list_songs(&self) -> Result<Vec<SongSummary>> {
        Ok(self.db.lock().list_songs()?)
    }

    pub fn list_charts(&self) -> Result<Vec<ChartSummary>> {
        Ok(self.db.lock().list_charts()?)
    }

    fn check_audio(&self, file: &AudioUpload) -> Result<()> {
        let size = file.bytes.len() as u64;
        validate_upload(&file.mime, size)?;
        if size > self.max_upload_bytes {
            return Err(UploadError::TooLarge { size }.into());
        }
        Ok(())
    }

    /// Object key `<prefix>/<millis>-<name>`, with a random tag added if that
    /// key is already taken.
    fn fresh_key(&self, make: impl Fn(&str) -> String) -> Result<String> {
        let millis = chrono::Utc::now().timestamp_millis().to_string();
        let key = make(&millis);
        if !self.objects.exists(&key)? {
            return Ok(key);
        }
        Ok(make(&format!("{millis}-{}", Uuid::new_v4().simple())))
    }

    fn discard(&self, keys: &[&str]) {
        for key in keys {
            if let Err(e) = self.objects.delete(key) {
                warn!(key, "Failed to roll back object: {e:#}");
            }
        }
    }

    /// Store a song and list it. Returns the object key.
    pub fn upload_song(&self, key: &str, title: &str, author: &str, file: &AudioUpload) -> Result<String> {
        let (title, author) = (title.trim(), author.trim());
        if title.is_empty() || author.is_empty() || file.bytes.is_empty() {
            return Err(StoreError::MissingFields);
        }
        self.check_audio(file)?;
        let user = self.authenticate(key)?;

        let name = sanitize_file_name(&file.file_name);
        let path = self.fresh_key(|stamp| format!("songs/{stamp}-{name}"))?;
        self.objects.put(&path, &file.bytes, &file.mime)?;

        let inserted = self.db.lock().insert_song(&NewSong {
            title,
            author,
            file_path: &path,
            uploaded_by: &user.lookup_key,
            file_size: file.bytes.len() as u64,
        });
        if let Err(e) = inserted {
            self.discard(&[&path]);
            return Err(e.into());
        }
        info!(path = %path, size = file.bytes.len(), "Song uploaded");
        Ok(path)
    }

    /// Store a recording: the audio, the chart text and a row tying them together.
    pub fn save_record(&self, key: &str, title: &str, music: &AudioUpload, notes: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() || music.bytes.is_empty() || notes.trim().is_empty() {
            return Err(StoreError::MissingFields);
        }
        deserialize(notes)?;
        self.check_audio(music)?;
        let user = self.authenticate(key)?;

        let name = sanitize_file_name(&music.file_name);
        let music_path = self.fresh_key(|stamp| format!("music/{stamp}-{name}"))?;
        self.objects.put(&music_path, &music.bytes, &music.mime)?;

        let note_path = match self.fresh_key(|stamp| format!("notes/{stamp}.txt")) {
            Ok(path) => path,
            Err(e) => {
                self.discard(&[&music_path]);
                return Err(e);
            }
        };
        if let Err(e) = self.objects.put(&note_path, notes.as_bytes(), "text/plain") {
            self.discard(&[&music_path]);
            return Err(e.into());
        }

        let inserted = self.db.lock().insert_record(&NewRecord {
            user_lookup_key: &user.lookup_key,
            title,
            music_file_path: &music_path,
            note_file_path: &note_path,
        });
        if let Err(e) = inserted {
            self.discard(&[&music_path, &note_path]);
            return Err(e.into());
        }
        info!(music_path = %music_path, note_path = %note_path, "Record saved");
        Ok(())
    }

    pub fn save_chart(&self, key: &str, music_path: &str, note_data: &str) -> Result<()> {
        let music_path = music_path.trim();
        if music_path.is_empty() || note_data.trim().is_empty() {
            return Err(StoreError::MissingFields);
        }
        deserialize(note_data)?;
        let user = self.authenticate(key)?;
        self.db
            .lock()
            .insert_chart(&user.lookup_key, music_path, note_data)?;
        info!(music_path, "Chart saved");
        Ok(())
    }
}
