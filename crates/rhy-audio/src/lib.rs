//! Audio playback for chart recording.
//!
//! [`PlaybackClock`] owns play/pause/seek state over a [`MediaBackend`] and is
//! sampled once per frame. [`KiraMediaBackend`] plays through the sound card;
//! [`OfflineMediaBackend`] advances with a [`TimeProvider`] for headless runs.

mod backend;
mod clock;
mod kira_backend;
mod offline;
pub mod probe;
mod source;
pub mod time;
pub mod wav;

pub use backend::MediaBackend;
pub use clock::{ClockError, PlaybackClock, PlaybackState};
pub use kira_backend::KiraMediaBackend;
pub use offline::OfflineMediaBackend;
pub use source::MediaSource;
pub use time::{MockTimeProvider, SystemTimeProvider, TimeProvider};
