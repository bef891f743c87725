use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use kira::sound::PlaybackState;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, AudioManagerSettings, DefaultBackend, Tween};
use tracing::{debug, info};

use crate::{MediaBackend, MediaSource};

/// Kira-based backend playing one decoded track through the default device.
pub struct KiraMediaBackend {
    manager: AudioManager,
    sound: Option<StaticSoundData>,
    handle: Option<StaticSoundHandle>,
    /// Where playback resumes when no live handle exists.
    resume_at: f64,
}

impl KiraMediaBackend {
    pub fn new() -> Result<Self> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| anyhow!("Failed to create audio manager: {e}"))?;
        Ok(Self {
            manager,
            sound: None,
            handle: None,
            resume_at: 0.0,
        })
    }

    fn live_handle(&mut self) -> Option<&mut StaticSoundHandle> {
        match self.handle.as_ref().map(|h| h.state()) {
            Some(PlaybackState::Stopped) | None => None,
            Some(_) => self.handle.as_mut(),
        }
    }
}

impl MediaBackend for KiraMediaBackend {
    fn open(&mut self, source: &MediaSource) -> Result<()> {
        self.close();
        let bytes: Arc<[u8]> = Arc::clone(source.bytes());
        let sound = StaticSoundData::from_cursor(Cursor::new(bytes))
            .map_err(|e| anyhow!("Failed to decode {}: {e}", source.name()))?;
        info!(
            name = source.name(),
            seconds = sound.duration().as_secs_f64(),
            "KiraMediaBackend: loaded track"
        );
        self.sound = Some(sound);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop(Tween::default());
        }
        if self.sound.take().is_some() {
            debug!("KiraMediaBackend: released track");
        }
        self.resume_at = 0.0;
    }

    fn play(&mut self) -> Result<()> {
        if let Some(handle) = self.live_handle() {
            handle.resume(Tween::default());
            return Ok(());
        }
        let Some(sound) = &self.sound else {
            bail!("No media loaded");
        };
        let data = sound.clone().start_position(self.resume_at);
        let handle = self
            .manager
            .play(data)
            .map_err(|e| anyhow!("Failed to start playback: {e}"))?;
        self.handle = Some(handle);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(handle) = self.live_handle() {
            handle.pause(Tween::default());
            let at = handle.position();
            self.resume_at = at;
        }
    }

    fn seek(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        self.resume_at = seconds;
        if let Some(handle) = self.live_handle() {
            handle.seek_to(seconds);
            return;
        }
        self.handle = None;
    }

    fn position(&self) -> f64 {
        match &self.handle {
            Some(handle) if handle.state() != PlaybackState::Stopped => handle.position(),
            Some(_) => self.duration().unwrap_or(self.resume_at),
            None => self.resume_at,
        }
    }

    fn duration(&self) -> Option<f64> {
        self.sound.as_ref().map(|s| s.duration().as_secs_f64())
    }
}
