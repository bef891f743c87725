use serde::{Deserialize, Serialize};

/// Whether a note event is a key going down or coming up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteKind {
    Press,
    Release,
}

impl NoteKind {
    /// Digit used in chart text: `0` = press, `1` = release.
    pub fn digit(self) -> char {
        match self {
            Self::Press => '0',
            Self::Release => '1',
        }
    }

    pub fn from_digit(digit: &str) -> Option<Self> {
        match digit {
            "0" => Some(Self::Press),
            "1" => Some(Self::Release),
            _ => None,
        }
    }
}

/// A single timestamped key transition recorded against the audio clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Playback position in seconds when the transition was handled.
    pub time: f64,
    /// Input symbol, e.g. `"d"`.
    pub key: String,
    pub kind: NoteKind,
}

impl NoteEvent {
    pub fn press(time: f64, key: impl Into<String>) -> Self {
        Self {
            time,
            key: key.into(),
            kind: NoteKind::Press,
        }
    }

    pub fn release(time: f64, key: impl Into<String>) -> Self {
        Self {
            time,
            key: key.into(),
            kind: NoteKind::Release,
        }
    }

    pub fn is_press(&self) -> bool {
        self.kind == NoteKind::Press
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_mapping() {
        assert_eq!(NoteKind::Press.digit(), '0');
        assert_eq!(NoteKind::Release.digit(), '1');
        assert_eq!(NoteKind::from_digit("0"), Some(NoteKind::Press));
        assert_eq!(NoteKind::from_digit("1"), Some(NoteKind::Release));
        assert_eq!(NoteKind::from_digit("2"), None);
        assert_eq!(NoteKind::from_digit(""), None);
    }

    #[test]
    fn constructors() {
        let p = NoteEvent::press(1.5, "d");
        assert!(p.is_press());
        assert_eq!(p.key, "d");
        let r = NoteEvent::release(2.0, "d");
        assert!(!r.is_press());
        assert_eq!(r.time, 2.0);
    }

    #[test]
    fn serde_round_trip() {
        let event = NoteEvent::press(0.25, "k");
        let json = serde_json::to_string(&event).unwrap();
        let back: NoteEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
