//! Note track rendering.
//!
//! The renderer draws through [`RenderBackend`], so the same frame can be
//! painted by the egui front end or captured by [`CommandRecorder`] in tests.

pub mod backend;
mod command_recorder;
mod schedule;
mod track;

pub use backend::{Color, Rect, RenderBackend};
pub use command_recorder::{CommandRecorder, DrawCommand};
pub use schedule::RenderSchedule;
pub use track::{NoteTrackRenderer, TrackConfig, TrackFrame};
