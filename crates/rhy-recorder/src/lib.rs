//! Interactive chart recorder.
//!
//! [`SessionController`] drives playback, input capture and rendering and
//! validates every storage action before it becomes a [`submit::Request`].
//! The egui front end lives in [`app`].

pub mod app;
pub mod clipboard;
pub mod config;
mod context;
mod error;
pub mod painter;
mod session;
pub mod submit;

use anyhow::Result;
use rhy_model::KeyMap;

pub use config::RecorderConfig;
pub use context::SessionContext;
pub use error::SessionError;
pub use session::{SessionController, SessionPhase};

/// Open the recorder window and block until it closes.
pub fn run(config: RecorderConfig, key_map: KeyMap, context: SessionContext) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.surface_width + 340.0, config.surface_height + 120.0])
            .with_title("rhy-recorder"),
        ..Default::default()
    };
    let app = app::RecorderApp::new(config, key_map, context)?;
    eframe::run_native("rhy-recorder", options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("eframe error: {e}"))
}
