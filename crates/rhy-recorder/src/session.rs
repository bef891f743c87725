use rhy_audio::{MediaBackend, MediaSource, PlaybackClock, PlaybackState};
use rhy_client::AudioFile;
use rhy_input::InputCapture;
use rhy_model::{KeyMap, NoteEvent, serialize, validate_upload};
use rhy_render::{NoteTrackRenderer, RenderBackend, RenderSchedule, TrackFrame};
use tracing::{debug, info};

use crate::clipboard::ClipboardSink;
use crate::submit::{Completed, Request};
use crate::{SessionContext, SessionError};

/// Where the recorder is in its media lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoMedia,
    /// Loaded and never started.
    MediaLoaded,
    Playing,
    Paused,
}

/// Wires media, input capture and rendering together, and turns user actions
/// into validated storage [`Request`]s.
///
/// Input is only recorded while the clock is playing. Selecting new media or
/// re-recording detaches input before the event list is cleared.
pub struct SessionController<B: MediaBackend> {
    clock: PlaybackClock<B>,
    capture: InputCapture,
    schedule: RenderSchedule,
    context: SessionContext,
    started: bool,
    /// Bumped whenever the event list changes.
    revision: u64,
}

impl<B: MediaBackend> SessionController<B> {
    pub fn new(backend: B, key_map: KeyMap, context: SessionContext) -> Self {
        Self {
            clock: PlaybackClock::new(backend),
            capture: InputCapture::new(key_map),
            schedule: RenderSchedule::new(),
            context,
            started: false,
            revision: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.clock.is_loaded() {
            SessionPhase::NoMedia
        } else if self.clock.is_playing() {
            SessionPhase::Playing
        } else if self.started {
            SessionPhase::Paused
        } else {
            SessionPhase::MediaLoaded
        }
    }

    /// Replace the current media. The previous recording is discarded even if
    /// the new file fails to load.
    pub fn select_media(&mut self, source: MediaSource) -> Result<(), SessionError> {
        self.capture.set_recording(false);
        self.capture.reset();
        self.revision += 1;
        self.started = false;
        self.schedule.mark_dirty();
        if let Err(e) = self.clock.load(source) {
            self.clock.unload();
            return Err(SessionError::Media(e));
        }
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), SessionError> {
        self.clock.play()?;
        self.started = true;
        self.capture.set_recording(true);
        self.schedule.mark_dirty();
        Ok(())
    }

    pub fn pause(&mut self) {
        self.clock.pause();
        self.capture.set_recording(false);
        self.schedule.mark_dirty();
    }

    pub fn toggle_playback(&mut self) -> Result<(), SessionError> {
        if self.clock.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Re-recording discards captured events, so ask first when there are any.
    pub fn re_record_needs_confirmation(&self) -> bool {
        self.clock.is_loaded() && !self.capture.is_empty()
    }

    /// Throw away the recording and start again from zero.
    pub fn re_record(&mut self) -> Result<(), SessionError> {
        if !self.clock.is_loaded() {
            return Err(SessionError::NoMedia);
        }
        self.capture.set_recording(false);
        self.capture.reset();
        self.revision += 1;
        self.schedule.mark_dirty();
        self.clock.restart_from_zero()?;
        self.started = true;
        self.capture.set_recording(true);
        info!("Re-recording from zero");
        Ok(())
    }

    /// Sample the clock. Call once per frame before drawing.
    pub fn tick(&mut self) -> PlaybackState {
        let was_playing = self.clock.is_playing();
        let state = self.clock.tick();
        if was_playing && !state.is_playing {
            self.capture.set_recording(false);
            self.schedule.mark_dirty();
        }
        state
    }

    /// Returns `true` if the press was recorded.
    pub fn key_down(&mut self, symbol: &str) -> bool {
        let at = self.clock.current_time();
        let recorded = self.capture.on_press(symbol, at);
        if recorded {
            self.revision += 1;
            self.schedule.mark_dirty();
        }
        recorded
    }

    /// Returns `true` if the release was recorded.
    pub fn key_up(&mut self, symbol: &str) -> bool {
        let at = self.clock.current_time();
        let recorded = self.capture.on_release(symbol, at);
        if recorded {
            self.revision += 1;
            self.schedule.mark_dirty();
        }
        recorded
    }

    /// Whether the track needs drawing this frame.
    pub fn should_render(&mut self) -> bool {
        self.schedule.should_render(self.clock.is_playing())
    }

    /// Note that the drawing surface changed and needs a redraw.
    pub fn invalidate(&mut self) {
        self.schedule.mark_dirty();
    }

    pub fn render<R: RenderBackend + ?Sized>(
        &self,
        renderer: &NoteTrackRenderer,
        backend: &mut R,
    ) -> anyhow::Result<bool> {
        let frame = TrackFrame {
            events: self.capture.events(),
            key_map: self.capture.key_map(),
            now: self.clock.current_time(),
            duration: self.clock.duration(),
        };
        renderer.render(backend, &frame)
    }

    pub fn events(&self) -> &[NoteEvent] {
        self.capture.events()
    }

    pub fn key_map(&self) -> &KeyMap {
        self.capture.key_map()
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_recording()
    }

    pub fn clock(&self) -> &PlaybackClock<B> {
        &self.clock
    }

    pub fn media(&self) -> Option<&MediaSource> {
        self.clock.source()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Changes whenever [`Self::events`] does.
    pub fn chart_revision(&self) -> u64 {
        self.revision
    }

    pub fn chart_text(&self) -> String {
        serialize(self.capture.events())
    }

    /// Copy the chart text to `sink` and return it.
    pub fn export_chart(&self, sink: &mut dyn ClipboardSink) -> Result<String, SessionError> {
        if self.capture.is_empty() {
            return Err(SessionError::NothingRecorded);
        }
        let text = self.chart_text();
        sink.set_text(&text).map_err(SessionError::Clipboard)?;
        debug!(events = self.capture.len(), "Chart exported");
        Ok(text)
    }

    fn token(&self) -> Result<String, SessionError> {
        self.context.token.clone().ok_or(SessionError::NotLoggedIn)
    }

    fn recorded_chart(&self) -> Result<String, SessionError> {
        if self.capture.is_empty() {
            return Err(SessionError::NothingRecorded);
        }
        Ok(self.chart_text())
    }

    /// Save the chart against a song already on the server.
    pub fn submit_chart(&self, music_path: &str) -> Result<Request, SessionError> {
        let token = self.token()?;
        let music_path = required(music_path, "Song")?;
        let chart = self.recorded_chart()?;
        Ok(Request::SubmitChart {
            token,
            music_path,
            chart,
        })
    }

    /// Save the chart together with the loaded audio.
    pub fn save_record(&self, title: &str) -> Result<Request, SessionError> {
        let token = self.token()?;
        let title = required(title, "Title")?;
        let source = self.clock.source().ok_or(SessionError::NoMedia)?;
        let music = audio_file(source)?;
        let chart = self.recorded_chart()?;
        Ok(Request::SaveRecord {
            token,
            title,
            music,
            chart,
        })
    }

    pub fn upload_song(&self, title: &str, author: &str, file: &MediaSource) -> Result<Request, SessionError> {
        let token = self.token()?;
        let title = required(title, "Title")?;
        let author = required(author, "Author")?;
        let file = audio_file(file)?;
        Ok(Request::UploadSong {
            token,
            title,
            author,
            file,
        })
    }

    pub fn login(&self, token: &str) -> Result<Request, SessionError> {
        let token = required(token, "Key")?;
        Ok(Request::Login { token })
    }

    pub fn generate_key(&self) -> Request {
        Request::GenerateKey
    }

    pub fn set_display_name(&self, name: &str) -> Result<Request, SessionError> {
        let token = self.token()?;
        let name = required(name, "Display name")?;
        Ok(Request::SetDisplayName { token, name })
    }

    pub fn refresh_songs(&self) -> Request {
        Request::RefreshSongs
    }

    pub fn logout(&mut self) {
        self.context.log_out();
        info!("Logged out");
    }

    /// Apply a finished request to the session context.
    pub fn apply(&mut self, completed: &Completed) {
        match completed {
            Completed::LoggedIn { token, display_name } => {
                self.context.log_in(token.clone(), display_name.clone());
            }
            Completed::DisplayNameSet { name } => {
                self.context.display_name = Some(name.clone());
            }
            Completed::Songs(songs) => {
                self.context.songs = songs.clone();
            }
            Completed::ChartSubmitted | Completed::RecordSaved | Completed::SongUploaded => {}
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<String, SessionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SessionError::MissingField(field));
    }
    Ok(value.to_string())
}

/// Check type and size before anything is sent.
fn audio_file(source: &MediaSource) -> Result<AudioFile, SessionError> {
    let mime = source.mime().map(|m| m.as_str()).unwrap_or("application/octet-stream");
    let mime = validate_upload(mime, source.len() as u64)?;
    Ok(AudioFile {
        file_name: source.name().to_string(),
        mime,
        bytes: source.bytes().clone(),
    })
}
