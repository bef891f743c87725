use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rhy_model::AudioMime;

/// An audio file held in memory.
///
/// The bytes are shared so the same buffer can feed the playback backend and
/// a later upload without copying.
#[derive(Debug, Clone)]
pub struct MediaSource {
    name: String,
    mime: Option<AudioMime>,
    bytes: Arc<[u8]>,
}

impl MediaSource {
    pub fn new(name: impl Into<String>, mime: Option<AudioMime>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime,
            bytes: bytes.into(),
        }
    }

    /// Read a file; the MIME type comes from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read audio file: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(AudioMime::from_extension);
        Ok(Self::new(name, mime, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> Option<AudioMime> {
        self.mime
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension hint for decoders.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|e| e.to_str())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn from_path_infers_mime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Song.OGG");
        fs::write(&path, b"OggS").unwrap();

        let source = MediaSource::from_path(&path).unwrap();
        assert_eq!(source.name(), "Song.OGG");
        assert_eq!(source.mime(), Some(AudioMime::Ogg));
        assert_eq!(source.len(), 4);
        assert_eq!(source.extension(), Some("OGG"));
    }

    #[test]
    fn from_path_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"x").unwrap();
        assert_eq!(MediaSource::from_path(&path).unwrap().mime(), None);
    }

    #[test]
    fn from_path_missing_file() {
        let dir = tempdir().unwrap();
        assert!(MediaSource::from_path(&dir.path().join("nope.wav")).is_err());
    }
}
