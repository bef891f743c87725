use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rhy_model::KeyMap;
use rhy_model::key_map::DEFAULT_LANE_SYMBOLS;
use serde::{Deserialize, Serialize};

/// Upper bound on lanes; anything past it is dropped on load.
pub const MAX_LANES: usize = 10;

/// Lane key bindings as stored on disk.
///
/// Symbols are the lower-case key names the front end reports, e.g. `"d"` or
/// `"space"`. Lane `i` is bound to `lanes[i]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeyBindings {
    pub lanes: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            lanes: DEFAULT_LANE_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl KeyBindings {
    /// Load bindings from a path.
    /// Returns the defaults if the file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read key bindings: {}", path.display()))?;
        let mut bindings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse key bindings: {}", path.display()))?;
        bindings.normalize();
        Ok(bindings)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Build the immutable lane lookup.
    pub fn to_key_map(&self) -> Result<KeyMap> {
        KeyMap::new(self.lanes.iter().cloned()).context("Invalid key bindings")
    }

    fn normalize(&mut self) {
        for lane in &mut self.lanes {
            *lane = lane.trim().to_lowercase();
        }
        self.lanes.retain(|s| !s.is_empty());
        self.lanes.truncate(MAX_LANES);
        if self.lanes.is_empty() {
            *self = Self::default();
        }
    }
}
