use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rhy_model::MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "rhy_server.json";

/// Server settings, read from JSON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub object_store_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            database_path: PathBuf::from("rhy.db"),
            object_store_dir: PathBuf::from("objects"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn validate(&mut self) {
        let defaults = Self::default();
        if self.bind_address.trim().is_empty() {
            self.bind_address = defaults.bind_address;
        }
        if self.database_path.as_os_str().is_empty() {
            self.database_path = defaults.database_path;
        }
        if self.object_store_dir.as_os_str().is_empty() {
            self.object_store_dir = defaults.object_store_dir;
        }
        self.max_upload_bytes = self.max_upload_bytes.clamp(1, MAX_UPLOAD_BYTES);
    }

    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: ServerConfig = serde_json::from_str(&data)
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
