use std::sync::Arc;

use anyhow::{Context, Result};
use rhy_audio::{KiraMediaBackend, MediaBackend, MediaSource, OfflineMediaBackend, SystemTimeProvider};
use rhy_client::HttpStorageClient;
use rhy_model::KeyMap;
use rhy_render::{NoteTrackRenderer, TrackConfig};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::clipboard::{ClipboardSink, MemoryClipboard, SystemClipboard};
use crate::painter::EguiPainter;
use crate::submit::{self, Completed, Request};
use crate::{RecorderConfig, SessionContext, SessionController, SessionError, SessionPhase};

const AUDIO_EXTENSIONS: &[&str] = &["wav", "ogg", "mp3"];

type Outcome = Result<Completed, SessionError>;

/// Sound card playback, or a silent clock if no output device is available.
pub fn media_backend() -> Box<dyn MediaBackend> {
    match KiraMediaBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            warn!("Audio output unavailable, playing silently: {e:#}");
            Box::new(OfflineMediaBackend::new(SystemTimeProvider::new()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    OpenMedia,
    TogglePlayback,
    ReRecord,
    ConfirmReRecord,
    Export,
    Login,
    GenerateKey,
    Logout,
    SetName,
    RefreshSongs,
    SubmitChart,
    SaveRecord,
    UploadSong,
}

pub struct RecorderApp {
    session: SessionController<Box<dyn MediaBackend>>,
    renderer: NoteTrackRenderer,
    config: RecorderConfig,
    client: Arc<HttpStorageClient>,
    runtime: Runtime,
    results_tx: mpsc::UnboundedSender<Outcome>,
    results_rx: mpsc::UnboundedReceiver<Outcome>,
    clipboard: Box<dyn ClipboardSink>,
    pending: usize,
    status: String,
    surface: egui::Rect,
    key_input: String,
    name_input: String,
    record_title: String,
    song_title: String,
    song_author: String,
    selected_song: Option<usize>,
    confirm_re_record: bool,
    /// Chart text and the event revision it was built from.
    chart_cache: (u64, String),
}

impl RecorderApp {
    pub fn new(config: RecorderConfig, key_map: KeyMap, context: SessionContext) -> Result<Self> {
        let client = HttpStorageClient::new(&config.server_url)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("rhy-net")
            .enable_all()
            .build()
            .context("Failed to start network runtime")?;
        let clipboard: Box<dyn ClipboardSink> = match SystemClipboard::new() {
            Ok(clipboard) => Box::new(clipboard),
            Err(e) => {
                warn!("{e:#}");
                Box::new(MemoryClipboard::default())
            }
        };
        let renderer = NoteTrackRenderer::new(TrackConfig {
            scroll_scale: config.scroll_scale,
            ..Default::default()
        });
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let key_input = context.token.clone().unwrap_or_default();
        let name_input = context.display_name.clone().unwrap_or_default();

        Ok(Self {
            session: SessionController::new(media_backend(), key_map, context),
            renderer,
            config,
            client: Arc::new(client),
            runtime,
            results_tx,
            results_rx,
            clipboard,
            pending: 0,
            status: String::new(),
            surface: egui::Rect::NOTHING,
            key_input,
            name_input,
            record_title: String::new(),
            song_title: String::new(),
            song_author: String::new(),
            selected_song: None,
            confirm_re_record: false,
            chart_cache: (0, String::new()),
        })
    }

    fn report(&mut self, e: &SessionError) {
        warn!("{e}");
        self.status = if e.needs_login() {
            format!("{e}. Log in with your key.")
        } else {
            e.to_string()
        };
    }

    fn save_context(&self) {
        if let Err(e) = self.session.context().save(&self.config.session_path) {
            error!("Failed to save session: {e:#}");
        }
    }

    /// Run a request on the network runtime. The result arrives through
    /// `results_rx` on a later frame.
    fn dispatch(&mut self, ctx: &egui::Context, request: Result<Request, SessionError>) {
        let request = match request {
            Ok(request) => request,
            Err(e) => return self.report(&e),
        };
        self.status = format!("Working: {}...", request.label());
        self.pending += 1;
        let client = Arc::clone(&self.client);
        let tx = self.results_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = submit::execute(client.as_ref(), request).await;
            // The receiver is gone only once the window has closed.
            let _ = tx.send(outcome);
            ctx.request_repaint();
        });
    }

    fn poll_results(&mut self, ctx: &egui::Context) {
        while let Ok(outcome) = self.results_rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            let completed = match outcome {
                Ok(completed) => completed,
                Err(e) => {
                    self.report(&e);
                    continue;
                }
            };
            self.session.apply(&completed);
            self.status = completed.message();
            match completed {
                Completed::LoggedIn { token, display_name } => {
                    self.key_input = token;
                    self.name_input = display_name.unwrap_or_default();
                    self.save_context();
                }
                Completed::DisplayNameSet { .. } => self.save_context(),
                Completed::Songs(_) => {
                    self.selected_song = None;
                    self.save_context();
                }
                Completed::SongUploaded => {
                    let request = self.session.refresh_songs();
                    self.dispatch(ctx, Ok(request));
                }
                Completed::ChartSubmitted | Completed::RecordSaved => {}
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let typing = ctx.wants_keyboard_input();
        let transitions = ctx.input(|i| key_transitions(&i.events, typing));
        for (symbol, pressed) in transitions {
            if pressed {
                self.session.key_down(&symbol);
            } else {
                self.session.key_up(&symbol);
            }
        }
    }

    fn refresh_chart_text(&mut self) {
        let revision = self.session.chart_revision();
        if self.chart_cache.0 != revision {
            self.chart_cache = (revision, self.session.chart_text());
        }
    }

    fn pick_audio(&self) -> Option<MediaSource> {
        let path = rfd::FileDialog::new()
            .add_filter("Audio", AUDIO_EXTENSIONS)
            .pick_file()?;
        match MediaSource::from_path(&path) {
            Ok(source) => Some(source),
            Err(e) => {
                error!("{e:#}");
                None
            }
        }
    }

    fn perform(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::OpenMedia => {
                let Some(source) = self.pick_audio() else {
                    return;
                };
                let name = source.name().to_string();
                match self.session.select_media(source) {
                    Ok(()) => {
                        info!(name = %name, "Media selected");
                        self.status = format!("Loaded {name}");
                    }
                    Err(e) => self.report(&e),
                }
            }
            Action::TogglePlayback => {
                if let Err(e) = self.session.toggle_playback() {
                    self.report(&e);
                }
            }
            Action::ReRecord if self.session.re_record_needs_confirmation() => {
                self.confirm_re_record = true;
            }
            Action::ReRecord | Action::ConfirmReRecord => {
                self.confirm_re_record = false;
                if let Err(e) = self.session.re_record() {
                    self.report(&e);
                }
            }
            Action::Export => match self.session.export_chart(self.clipboard.as_mut()) {
                Ok(text) => self.status = format!("Copied {} lines to the clipboard", text.lines().count()),
                Err(e) => self.report(&e),
            },
            Action::Login => {
                let request = self.session.login(&self.key_input);
                self.dispatch(ctx, request);
            }
            Action::GenerateKey => {
                let request = self.session.generate_key();
                self.dispatch(ctx, Ok(request));
            }
            Action::Logout => {
                self.session.logout();
                self.key_input.clear();
                self.name_input.clear();
                self.save_context();
                self.status = "Logged out".to_string();
            }
            Action::SetName => {
                let request = self.session.set_display_name(&self.name_input);
                self.dispatch(ctx, request);
            }
            Action::RefreshSongs => {
                let request = self.session.refresh_songs();
                self.dispatch(ctx, Ok(request));
            }
            Action::SubmitChart => {
                let music_path = self
                    .selected_song
                    .and_then(|i| self.session.context().songs.get(i))
                    .map(|song| song.file_path.clone())
                    .unwrap_or_default();
                let request = self.session.submit_chart(&music_path);
                self.dispatch(ctx, request);
            }
            Action::SaveRecord => {
                let request = self.session.save_record(&self.record_title);
                self.dispatch(ctx, request);
            }
            Action::UploadSong => {
                let Some(file) = self.pick_audio() else {
                    return;
                };
                let request = self.session.upload_song(&self.song_title, &self.song_author, &file);
                self.dispatch(ctx, request);
            }
        }
    }

    fn transport_ui(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            if ui.button("Open audio...").clicked() {
                actions.push(Action::OpenMedia);
            }
            let phase = self.session.phase();
            let has_media = phase != SessionPhase::NoMedia;
            let label = if phase == SessionPhase::Playing { "Pause" } else { "Play" };
            if ui.add_enabled(has_media, egui::Button::new(label)).clicked() {
                actions.push(Action::TogglePlayback);
            }
            if ui.add_enabled(has_media, egui::Button::new("Re-record")).clicked() {
                actions.push(Action::ReRecord);
            }
            if ui.button("Copy chart").clicked() {
                actions.push(Action::Export);
            }
            ui.separator();
            match self.session.media() {
                Some(media) => ui.label(media.name()),
                None => ui.label("No audio loaded"),
            };
            let clock = self.session.clock();
            let duration = clock
                .duration()
                .map(|d| format!("{d:.2}"))
                .unwrap_or_else(|| "--".to_string());
            ui.label(format!("{:.2} / {duration} s", clock.current_time()));
            ui.label(format!("{} events", self.session.events().len()));
            if self.session.is_recording() {
                ui.colored_label(egui::Color32::RED, "REC");
            }
        });
    }

    fn account_ui(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.heading("Account");
        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Key");
            ui.add(egui::TextEdit::singleline(&mut self.key_input).password(true));
        });
        ui.horizontal(|ui| {
            if ui.button("Log in").clicked() {
                actions.push(Action::Login);
            }
            if ui.button("Generate key").clicked() {
                actions.push(Action::GenerateKey);
            }
            if ui
                .add_enabled(self.session.context().is_logged_in(), egui::Button::new("Log out"))
                .clicked()
            {
                actions.push(Action::Logout);
            }
        });
        if let Some(token) = self.session.context().token.clone() {
            ui.horizontal(|ui| {
                ui.label(token.as_str());
                if ui.small_button("Copy").clicked() {
                    ui.ctx().copy_text(token.clone());
                }
            });
            ui.horizontal(|ui| {
                ui.label("Display name");
                ui.text_edit_singleline(&mut self.name_input);
                if ui.button("Set").clicked() {
                    actions.push(Action::SetName);
                }
            });
        }
    }

    fn songs_ui(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            ui.heading("Songs");
            if ui.small_button("Refresh").clicked() {
                actions.push(Action::RefreshSongs);
            }
        });
        ui.separator();
        egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
            let songs = &self.session.context().songs;
            if songs.is_empty() {
                ui.label("No songs.");
            }
            for (i, song) in songs.iter().enumerate() {
                let uploader = song.uploader.as_deref().unwrap_or("anonymous");
                let text = format!("{} - {} ({uploader})", song.title, song.author);
                if ui.selectable_label(self.selected_song == Some(i), text).clicked() {
                    self.selected_song = Some(i);
                }
            }
        });
        if ui.button("Submit chart to selected song").clicked() {
            actions.push(Action::SubmitChart);
        }

        ui.add_space(8.0);
        ui.heading("Save record");
        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Title");
            ui.text_edit_singleline(&mut self.record_title);
        });
        if ui.button("Save chart with audio").clicked() {
            actions.push(Action::SaveRecord);
        }

        ui.add_space(8.0);
        ui.heading("Upload song");
        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Title");
            ui.text_edit_singleline(&mut self.song_title);
        });
        ui.horizontal(|ui| {
            ui.label("Author");
            ui.text_edit_singleline(&mut self.song_author);
        });
        if ui.button("Choose file and upload...").clicked() {
            actions.push(Action::UploadSong);
        }
    }

    fn notes_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Recorded notes");
        ui.separator();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add(egui::Label::new(egui::RichText::new(self.chart_cache.1.as_str()).monospace()).extend());
            });
    }

    fn confirm_ui(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        egui::Window::new("Re-record")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Discard the {} recorded events and start again?",
                    self.session.events().len()
                ));
                ui.horizontal(|ui| {
                    if ui.button("Discard").clicked() {
                        actions.push(Action::ConfirmReRecord);
                    }
                    if ui.button("Cancel").clicked() {
                        self.confirm_re_record = false;
                    }
                });
            });
    }

    fn track_ui(&mut self, ui: &mut egui::Ui) {
        let size = egui::vec2(self.config.surface_width, self.config.surface_height);
        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
        if rect != self.surface {
            self.surface = rect;
            self.session.invalidate();
        }
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::from_gray(16));
        let mut backend = EguiPainter::new(&painter, rect);
        if let Err(e) = self.session.render(&self.renderer, &mut backend) {
            error!("Render failed: {e:#}");
        }
    }
}

impl eframe::App for RecorderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_results(ctx);
        self.handle_keys(ctx);
        self.session.tick();

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("transport").show(ctx, |ui| {
            self.transport_ui(ui, &mut actions);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.pending > 0 {
                    ui.spinner();
                }
                ui.label(self.status.as_str());
            });
        });

        egui::SidePanel::right("account")
            .resizable(false)
            .default_width(300.0)
            .show(ctx, |ui| {
                self.account_ui(ui, &mut actions);
                ui.add_space(8.0);
                self.songs_ui(ui, &mut actions);
            });

        self.refresh_chart_text();
        egui::SidePanel::left("notes")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                self.notes_ui(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.track_ui(ui);
        });

        if self.confirm_re_record {
            self.confirm_ui(ctx, &mut actions);
        }

        for action in actions {
            self.perform(ctx, action);
        }

        if self.session.should_render() {
            ctx.request_repaint();
        }
    }
}

/// Key transitions to forward to the recorder as `(symbol, pressed)`.
///
/// While a text field has focus presses belong to the field, but releases are
/// still forwarded so a held note is never left open.
fn key_transitions(events: &[egui::Event], typing: bool) -> Vec<(String, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            egui::Event::Key { key, pressed, .. } if !(typing && *pressed) => {
                Some((key.name().to_lowercase(), *pressed))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: egui::Key, pressed: bool) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }
    }

    #[test]
    fn presses_and_releases_forwarded() {
        let events = [key(egui::Key::D, true), egui::Event::Text("d".into()), key(egui::Key::D, false)];
        assert_eq!(
            key_transitions(&events, false),
            vec![("d".to_string(), true), ("d".to_string(), false)]
        );
    }

    #[test]
    fn releases_still_forwarded_while_typing() {
        let events = [key(egui::Key::F, true), key(egui::Key::D, false)];
        assert_eq!(key_transitions(&events, true), vec![("d".to_string(), false)]);
    }
}
