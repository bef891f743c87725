use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest audio file accepted for upload (15 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 15 * 1024 * 1024;

/// Audio types accepted by the storage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioMime {
    #[serde(rename = "audio/wav")]
    Wav,
    #[serde(rename = "audio/ogg")]
    Ogg,
    #[serde(rename = "audio/mpeg")]
    Mpeg,
}

impl AudioMime {
    pub const ALL: &'static [AudioMime] = &[Self::Wav, Self::Ogg, Self::Mpeg];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
            Self::Mpeg => "audio/mpeg",
        }
    }

    pub fn parse(mime: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == mime)
    }

    /// Guess the type from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "ogg" | "oga" => Some(Self::Ogg),
            "mp3" | "mpeg" => Some(Self::Mpeg),
            _ => None,
        }
    }

    /// Extension hint for decoders.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Mpeg => "mp3",
        }
    }
}

impl fmt::Display for AudioMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Invalid file type. Only WAV, OGG, and MP3 are allowed.")]
    InvalidType { mime: String },
    #[error("File too large. Maximum size is 15MB.")]
    TooLarge { size: u64 },
    #[error("File is empty.")]
    Empty,
}

/// Check an upload against the allow-list and size ceiling.
pub fn validate_upload(mime: &str, size: u64) -> Result<AudioMime, UploadError> {
    let parsed = AudioMime::parse(mime).ok_or_else(|| UploadError::InvalidType {
        mime: mime.to_string(),
    })?;
    if size == 0 {
        return Err(UploadError::Empty);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { size });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list() {
        assert_eq!(AudioMime::parse("audio/wav"), Some(AudioMime::Wav));
        assert_eq!(AudioMime::parse("audio/ogg"), Some(AudioMime::Ogg));
        assert_eq!(AudioMime::parse("audio/mpeg"), Some(AudioMime::Mpeg));
        assert_eq!(AudioMime::parse("audio/flac"), None);
        assert_eq!(AudioMime::parse("audio/mp3"), None);
    }

    #[test]
    fn extension_guess() {
        assert_eq!(AudioMime::from_extension("MP3"), Some(AudioMime::Mpeg));
        assert_eq!(AudioMime::from_extension("ogg"), Some(AudioMime::Ogg));
        assert_eq!(AudioMime::from_extension("wav"), Some(AudioMime::Wav));
        assert_eq!(AudioMime::from_extension("flac"), None);
    }

    #[test]
    fn validate_rejects_type_before_size() {
        assert_eq!(
            validate_upload("video/mp4", MAX_UPLOAD_BYTES + 1),
            Err(UploadError::InvalidType {
                mime: "video/mp4".to_string()
            })
        );
    }

    #[test]
    fn validate_size_ceiling() {
        assert_eq!(
            validate_upload("audio/wav", MAX_UPLOAD_BYTES),
            Ok(AudioMime::Wav)
        );
        assert_eq!(
            validate_upload("audio/wav", MAX_UPLOAD_BYTES + 1),
            Err(UploadError::TooLarge {
                size: MAX_UPLOAD_BYTES + 1
            })
        );
        assert_eq!(validate_upload("audio/ogg", 0), Err(UploadError::Empty));
    }

    #[test]
    fn serde_uses_mime_strings() {
        let json = serde_json::to_string(&AudioMime::Mpeg).unwrap();
        assert_eq!(json, "\"audio/mpeg\"");
    }
}
