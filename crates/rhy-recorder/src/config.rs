use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "rhy_recorder.json";

/// Recorder settings, read from JSON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub server_url: String,
    pub surface_width: f32,
    pub surface_height: f32,
    /// Pixels per second of playback.
    pub scroll_scale: f64,
    pub key_bindings_path: PathBuf,
    pub session_path: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
            surface_width: 800.0,
            surface_height: 400.0,
            scroll_scale: 20.0,
            key_bindings_path: PathBuf::from("keys.json"),
            session_path: PathBuf::from("session.json"),
        }
    }
}

impl RecorderConfig {
    pub fn validate(&mut self) {
        let defaults = Self::default();
        if self.server_url.trim().is_empty() {
            self.server_url = defaults.server_url;
        }
        if !self.surface_width.is_finite() {
            self.surface_width = defaults.surface_width;
        }
        if !self.surface_height.is_finite() {
            self.surface_height = defaults.surface_height;
        }
        self.surface_width = self.surface_width.clamp(200.0, 4096.0);
        self.surface_height = self.surface_height.clamp(100.0, 4096.0);
        if !self.scroll_scale.is_finite() {
            self.scroll_scale = defaults.scroll_scale;
        }
        self.scroll_scale = self.scroll_scale.clamp(1.0, 1000.0);
        if self.key_bindings_path.as_os_str().is_empty() {
            self.key_bindings_path = defaults.key_bindings_path;
        }
        if self.session_path.as_os_str().is_empty() {
            self.session_path = defaults.session_path;
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: RecorderConfig = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate();
        Ok(config)
    }

    /// Read `path` if it exists, otherwise use defaults.
    pub fn read_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::read(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_default_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recorder.json");
        RecorderConfig::default().write(&path).unwrap();
        assert_eq!(RecorderConfig::read(&path).unwrap(), RecorderConfig::default());
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = RecorderConfig {
            surface_width: 10.0,
            surface_height: f32::NAN,
            scroll_scale: 0.0,
            server_url: String::new(),
            ..Default::default()
        };
        config.validate();
        assert_eq!(config.surface_width, 200.0);
        assert_eq!(config.surface_height, 400.0);
        assert_eq!(config.scroll_scale, 1.0);
        assert_eq!(config.server_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recorder.json");
        std::fs::write(&path, r#"{"scroll_scale": 40}"#).unwrap();
        let config = RecorderConfig::read(&path).unwrap();
        assert_eq!(config.scroll_scale, 40.0);
        assert_eq!(config.surface_width, 800.0);
    }
}
