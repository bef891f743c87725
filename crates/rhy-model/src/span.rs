use crate::note::{NoteEvent, NoteKind};

/// A press paired with the next release of the same key.
///
/// `end` is `None` while the key is still held.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSpan<'a> {
    pub key: &'a str,
    pub start: f64,
    pub end: Option<f64>,
}

impl NoteSpan<'_> {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Pair presses with releases in a single in-order scan.
///
/// Closed spans come out in the order their release appears; spans still open
/// after the scan follow, in the order their press appeared. A release with no
/// pending press yields nothing, and a second press of a pending key replaces
/// its start. Events are never re-sorted.
pub fn pair_spans(events: &[NoteEvent]) -> Vec<NoteSpan<'_>> {
    let mut spans = Vec::new();
    let mut pending: Vec<(&str, f64)> = Vec::new();

    for event in events {
        let key = event.key.as_str();
        let slot = pending.iter().position(|(k, _)| *k == key);
        match (event.kind, slot) {
            (NoteKind::Press, Some(i)) => {
                pending.remove(i);
                pending.push((key, event.time));
            }
            (NoteKind::Press, None) => pending.push((key, event.time)),
            (NoteKind::Release, Some(i)) => {
                let (key, start) = pending.remove(i);
                spans.push(NoteSpan {
                    key,
                    start,
                    end: Some(event.time),
                });
            }
            (NoteKind::Release, None) => {}
        }
    }

    spans.extend(pending.into_iter().map(|(key, start)| NoteSpan {
        key,
        start,
        end: None,
    }));
    spans
}
