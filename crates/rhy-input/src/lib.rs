//! Keyboard input for chart recording.
//!
//! This crate provides:
//! - [`InputCapture`]: recording gate, held-key tracking and the note event list
//! - [`KeyBindings`]: lane symbol configuration with save/load

mod capture;
mod key_bindings;

pub use capture::InputCapture;
pub use key_bindings::KeyBindings;
