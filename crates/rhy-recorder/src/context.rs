use std::path::Path;

use anyhow::{Context, Result};
use rhy_model::api::SongSummary;
use serde::{Deserialize, Serialize};

/// Login state and the last song list, persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionContext {
    pub token: Option<String>,
    pub display_name: Option<String>,
    pub songs: Vec<SongSummary>,
}

impl SessionContext {
    /// Load from `path`. A missing file yields an empty context.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session: {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("Failed to parse session: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write session: {}", path.display()))
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn log_in(&mut self, token: String, display_name: Option<String>) {
        self.token = Some(token);
        self.display_name = display_name;
    }

    pub fn log_out(&mut self) {
        self.token = None;
        self.display_name = None;
    }
}
