use std::path::Path;

use anyhow::{Context, Result};
use rhy_model::api::{ChartSummary, SongSummary};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use crate::schema::{ALL_TABLES, ensure_table};

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub lookup_key: String,
    pub key_hash: String,
    pub salt: String,
    pub username: Option<String>,
    pub created_at: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            lookup_key: row.get("lookup_key")?,
            key_hash: row.get("key_hash")?,
            salt: row.get("salt")?,
            username: row.get("username")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewSong<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub file_path: &'a str,
    pub uploaded_by: &'a str,
    pub file_size: u64,
}

#[derive(Debug, Clone)]
pub struct NewRecord<'a> {
    pub user_lookup_key: &'a str,
    pub title: &'a str,
    pub music_file_path: &'a str,
    pub note_file_path: &'a str,
}

/// Outcome of assigning a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetUsername {
    Updated,
    /// Another user already has the name.
    Taken,
    /// This user already has a name.
    AlreadySet,
    UnknownUser,
}

/// SQLite store for users, songs, records and charts.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        for table in ALL_TABLES {
            ensure_table(&conn, table)
                .with_context(|| format!("Failed to initialize table {}", table.name))?;
        }
        Ok(Self { conn })
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    pub fn insert_user(&self, lookup_key: &str, key_hash: &str, salt: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (lookup_key, key_hash, salt, username, created_at) VALUES (?1, ?2, ?3, NULL, ?4)",
            params![lookup_key, key_hash, salt, Self::now()],
        )?;
        Ok(())
    }

    pub fn find_user(&self, lookup_key: &str) -> Result<Option<UserRow>> {
        let user = self
            .conn
            .query_row(
                "SELECT * FROM users WHERE lookup_key = ?1",
                [lookup_key],
                UserRow::from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn set_username(&self, lookup_key: &str, username: &str) -> Result<SetUsername> {
        let Some(user) = self.find_user(lookup_key)? else {
            return Ok(SetUsername::UnknownUser);
        };
        if user.username.is_some() {
            return Ok(SetUsername::AlreadySet);
        }
        let result = self.conn.execute(
            "UPDATE users SET username = ?1 WHERE lookup_key = ?2 AND username IS NULL",
            params![username, lookup_key],
        );
        match result {
            Ok(0) => Ok(SetUsername::AlreadySet),
            Ok(_) => Ok(SetUsername::Updated),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Ok(SetUsername::Taken)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert_song(&self, song: &NewSong<'_>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO songs (title, author, file_path, uploaded_by, file_size, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                song.title,
                song.author,
                song.file_path,
                song.uploaded_by,
                song.file_size as i64,
                Self::now()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All songs, newest first, with the uploader's display name.
    pub fn list_songs(&self) -> Result<Vec<SongSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.title, s.author, s.file_path, s.file_size, s.created_at, u.username AS uploader
             FROM songs s
             LEFT JOIN users u ON s.uploaded_by = u.lookup_key
             ORDER BY s.created_at DESC, s.id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SongSummary {
                id: row.get("id")?,
                title: row.get("title")?,
                author: row.get("author")?,
                file_path: row.get("file_path")?,
                file_size: row.get::<_, i64>("file_size")?.max(0) as u64,
                uploader: row.get("uploader")?,
                created_at: row.get("created_at")?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn insert_record(&self, record: &NewRecord<'_>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO records (user_lookup_key, title, music_file_path, note_file_path, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.user_lookup_key,
                record.title,
                record.music_file_path,
                record.note_file_path,
                Self::now()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn count_records(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?)
    }

    pub fn insert_chart(&self, user_lookup_key: &str, music_path: &str, note_data: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO note_charts (user_lookup_key, music_path, note_data, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_lookup_key, music_path, note_data, Self::now()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All charts, newest first, with the author's display name.
    pub fn list_charts(&self) -> Result<Vec<ChartSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.music_path, c.note_data, c.created_at, u.username
             FROM note_charts c
             LEFT JOIN users u ON c.user_lookup_key = u.lookup_key
             ORDER BY c.created_at DESC, c.id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ChartSummary {
                id: row.get("id")?,
                music_path: row.get("music_path")?,
                note_data: row.get("note_data")?,
                username: row.get("username")?,
                created_at: row.get("created_at")?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
