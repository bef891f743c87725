use anyhow::{Result, bail};
use tracing::warn;

use crate::{MediaBackend, MediaSource, TimeProvider, probe};

/// Headless backend: the playhead advances with a [`TimeProvider`] and the
/// track length is read from the container with symphonia.
///
/// Sources symphonia cannot parse still open, but refuse to play, like a
/// media element whose codec the host lacks.
pub struct OfflineMediaBackend<T: TimeProvider> {
    time: T,
    opened: bool,
    playable: bool,
    duration: Option<f64>,
    /// Position at the moment playback last started or was sought.
    base: f64,
    /// `time.now_us()` when playback last started; `None` while paused.
    started_us: Option<i64>,
}

impl<T: TimeProvider> OfflineMediaBackend<T> {
    pub fn new(time: T) -> Self {
        Self {
            time,
            opened: false,
            playable: false,
            duration: None,
            base: 0.0,
            started_us: None,
        }
    }

    fn elapsed(&self) -> f64 {
        match self.started_us {
            Some(start) => (self.time.now_us() - start).max(0) as f64 / 1_000_000.0,
            None => 0.0,
        }
    }

    fn clamp(&self, seconds: f64) -> f64 {
        let seconds = seconds.max(0.0);
        match self.duration {
            Some(d) => seconds.min(d),
            None => seconds,
        }
    }
}

impl<T: TimeProvider> MediaBackend for OfflineMediaBackend<T> {
    fn open(&mut self, source: &MediaSource) -> Result<()> {
        self.close();
        match probe::duration(source.bytes(), source.extension()) {
            Ok(duration) => {
                self.playable = true;
                self.duration = duration;
            }
            Err(e) => {
                warn!(name = source.name(), "Cannot read audio metadata: {e:#}");
                self.playable = false;
                self.duration = None;
            }
        }
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
        self.playable = false;
        self.duration = None;
        self.base = 0.0;
        self.started_us = None;
    }

    fn play(&mut self) -> Result<()> {
        if !self.opened {
            bail!("No media loaded");
        }
        if !self.playable {
            bail!("Unsupported audio format");
        }
        if self.started_us.is_none() {
            self.started_us = Some(self.time.now_us());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.started_us.is_some() {
            self.base = self.position();
            self.started_us = None;
        }
    }

    fn seek(&mut self, seconds: f64) {
        self.base = self.clamp(seconds);
        if self.started_us.is_some() {
            self.started_us = Some(self.time.now_us());
        }
    }

    fn position(&self) -> f64 {
        self.clamp(self.base + self.elapsed())
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockTimeProvider, wav};

    fn wav_source(seconds: f64) -> MediaSource {
        MediaSource::new("clip.wav", None, wav::silence(seconds, 8000))
    }

    #[test]
    fn position_follows_time_while_playing() {
        let time = MockTimeProvider::new();
        let mut backend = OfflineMediaBackend::new(time.clone());
        backend.open(&wav_source(10.0)).unwrap();
        assert!((backend.duration().unwrap() - 10.0).abs() < 1e-3);

        backend.play().unwrap();
        time.advance_secs(1.5);
        assert!((backend.position() - 1.5).abs() < 1e-9);

        backend.pause();
        time.advance_secs(3.0);
        assert!((backend.position() - 1.5).abs() < 1e-9);

        backend.play().unwrap();
        time.advance_secs(0.5);
        assert!((backend.position() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn position_stops_at_end() {
        let time = MockTimeProvider::new();
        let mut backend = OfflineMediaBackend::new(time.clone());
        backend.open(&wav_source(1.0)).unwrap();
        backend.play().unwrap();
        time.advance_secs(5.0);
        assert!((backend.position() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn seek_while_playing() {
        let time = MockTimeProvider::new();
        let mut backend = OfflineMediaBackend::new(time.clone());
        backend.open(&wav_source(10.0)).unwrap();
        backend.play().unwrap();
        time.advance_secs(4.0);
        backend.seek(0.0);
        assert_eq!(backend.position(), 0.0);
        time.advance_secs(1.0);
        assert!((backend.position() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn play_without_media_fails() {
        let mut backend = OfflineMediaBackend::new(MockTimeProvider::new());
        assert!(backend.play().is_err());
    }

    #[test]
    fn undecodable_media_opens_but_refuses_to_play() {
        let mut backend = OfflineMediaBackend::new(MockTimeProvider::new());
        let source = MediaSource::new("broken.mp3", None, vec![0u8; 32]);
        backend.open(&source).unwrap();
        assert_eq!(backend.duration(), None);
        assert!(backend.play().is_err());
    }
}
