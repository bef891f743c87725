use std::collections::HashSet;

use rhy_model::{KeyMap, NoteEvent};
use tracing::debug;

/// Records timestamped press/release events while recording is on.
///
/// Auto-repeat presses of a key that is already down are dropped, so events
/// for one key alternate press/release. Releases are kept even if the key was
/// never seen going down.
#[derive(Debug)]
pub struct InputCapture {
    key_map: KeyMap,
    recording: bool,
    held: HashSet<String>,
    events: Vec<NoteEvent>,
}

impl InputCapture {
    pub fn new(key_map: KeyMap) -> Self {
        Self {
            key_map,
            recording: false,
            held: HashSet::new(),
            events: Vec::with_capacity(1024),
        }
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Handle a key going down at playback position `at`.
    /// Returns `true` if an event was appended.
    pub fn on_press(&mut self, symbol: &str, at: f64) -> bool {
        if !self.recording || !self.key_map.contains(symbol) || self.held.contains(symbol) {
            return false;
        }
        self.held.insert(symbol.to_string());
        self.events.push(NoteEvent::press(at, symbol));
        true
    }

    /// Handle a key coming up at playback position `at`.
    /// Returns `true` if an event was appended.
    pub fn on_release(&mut self, symbol: &str, at: f64) -> bool {
        if !self.recording || !self.key_map.contains(symbol) {
            return false;
        }
        self.held.remove(symbol);
        self.events.push(NoteEvent::release(at, symbol));
        true
    }

    /// Drop all held keys and recorded events.
    pub fn reset(&mut self) {
        if !self.events.is_empty() {
            debug!(events = self.events.len(), "Clearing recorded events");
        }
        self.held.clear();
        self.events.clear();
    }

    pub fn is_held(&self, symbol: &str) -> bool {
        self.held.contains(symbol)
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for InputCapture {
    fn default() -> Self {
        Self::new(KeyMap::default())
    }
}
