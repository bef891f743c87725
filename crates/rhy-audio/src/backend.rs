use anyhow::Result;

use crate::MediaSource;

/// Abstraction over media playback.
/// Implementations: KiraMediaBackend (sound card), OfflineMediaBackend (headless).
pub trait MediaBackend {
    /// Prepare a source for playback at position zero, paused.
    fn open(&mut self, source: &MediaSource) -> Result<()>;

    /// Release the current source. No-op if nothing is open.
    fn close(&mut self);

    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);

    /// Playback position in seconds.
    fn position(&self) -> f64;

    /// Track length in seconds, once metadata is available.
    fn duration(&self) -> Option<f64>;
}

impl<B: MediaBackend + ?Sized> MediaBackend for Box<B> {
    fn open(&mut self, source: &MediaSource) -> Result<()> {
        (**self).open(source)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn seek(&mut self, seconds: f64) {
        (**self).seek(seconds)
    }

    fn position(&self) -> f64 {
        (**self).position()
    }

    fn duration(&self) -> Option<f64> {
        (**self).duration()
    }
}
