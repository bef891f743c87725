// Chart model: key map, note events, chart text codec, span pairing, upload rules

pub mod api;
pub mod chart;
pub mod key_map;
pub mod note;
pub mod span;
pub mod upload;

pub use chart::{ChartError, deserialize, serialize};
pub use key_map::{KeyMap, KeyMapError};
pub use note::{NoteEvent, NoteKind};
pub use span::{NoteSpan, pair_spans};
pub use upload::{AudioMime, MAX_UPLOAD_BYTES, UploadError, validate_upload};
