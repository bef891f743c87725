use thiserror::Error;
use tracing::{info, warn};

use crate::{MediaBackend, MediaSource};

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("no media loaded")]
    NoMedia,
    #[error("playback failed: {0:#}")]
    Backend(#[source] anyhow::Error),
}

/// Snapshot of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: f64,
    /// `None` until the backend reports metadata.
    pub duration: Option<f64>,
}

/// Transport over a [`MediaBackend`], sampled once per frame with [`tick`].
///
/// `current_time` never moves backwards while playing; only [`seek`] and
/// [`restart_from_zero`] rewind it. When the track runs out the clock pauses
/// itself.
///
/// [`tick`]: PlaybackClock::tick
/// [`seek`]: PlaybackClock::seek
/// [`restart_from_zero`]: PlaybackClock::restart_from_zero
pub struct PlaybackClock<B: MediaBackend> {
    backend: B,
    source: Option<MediaSource>,
    state: PlaybackState,
}

impl<B: MediaBackend> PlaybackClock<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            source: None,
            state: PlaybackState::default(),
        }
    }

    /// Open a new source, releasing the previous one first.
    pub fn load(&mut self, source: MediaSource) -> anyhow::Result<()> {
        self.unload();
        self.backend.open(&source)?;
        info!(name = source.name(), bytes = source.len(), "Media loaded");
        self.state.duration = self.backend.duration();
        self.source = Some(source);
        Ok(())
    }

    /// Release the current source. No-op if nothing is loaded.
    pub fn unload(&mut self) {
        if let Some(previous) = self.source.take() {
            self.backend.pause();
            self.backend.close();
            info!(name = previous.name(), "Media released");
        }
        self.state = PlaybackState::default();
    }

    pub fn play(&mut self) -> Result<(), ClockError> {
        if self.source.is_none() {
            return Err(ClockError::NoMedia);
        }
        if self.state.is_playing {
            return Ok(());
        }
        if let Err(e) = self.backend.play() {
            warn!("Playback rejected: {e:#}");
            self.backend.pause();
            self.state.is_playing = false;
            return Err(ClockError::Backend(e));
        }
        self.state.is_playing = true;
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state.is_playing {
            self.backend.pause();
            self.state.is_playing = false;
            self.state.current_time = self.backend.position().max(self.state.current_time);
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        if self.source.is_none() {
            return;
        }
        self.backend.seek(seconds);
        self.state.current_time = self.backend.position();
    }

    /// Rewind to zero and start playing.
    pub fn restart_from_zero(&mut self) -> Result<(), ClockError> {
        if self.source.is_none() {
            return Err(ClockError::NoMedia);
        }
        self.seek(0.0);
        self.state.current_time = 0.0;
        self.play()
    }

    /// Sample the backend. Call once per frame.
    pub fn tick(&mut self) -> PlaybackState {
        if self.state.duration.is_none() && self.source.is_some() {
            self.state.duration = self.backend.duration();
        }
        if self.state.is_playing {
            self.state.current_time = self.current_time();
            if let Some(duration) = self.state.duration
                && self.state.current_time >= duration
            {
                info!(duration, "Playback reached end of track");
                self.backend.pause();
                self.state.is_playing = false;
            }
        }
        self.state
    }

    /// Playback position right now, without waiting for the next tick.
    pub fn current_time(&self) -> f64 {
        if self.state.is_playing {
            self.backend.position().max(self.state.current_time)
        } else {
            self.state.current_time
        }
    }

    pub fn duration(&self) -> Option<f64> {
        self.state.duration
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
