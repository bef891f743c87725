//! Chart text codec.
//!
//! One line per note event, `<time>:<kind>:<key>`, where time has exactly six
//! decimals and kind is `0` (press) or `1` (release). Lines are joined with
//! `\n` and there is no trailing newline. Stored charts use this format, so
//! the output must stay byte-identical.

use thiserror::Error;

use crate::note::{NoteEvent, NoteKind};

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("line {line}: expected `<time>:<kind>:<key>`")]
    MissingField { line: usize },

    #[error("line {line}: invalid time `{value}`")]
    InvalidTime { line: usize, value: String },

    #[error("line {line}: invalid kind `{value}`, expected 0 or 1")]
    InvalidKind { line: usize, value: String },

    #[error("line {line}: empty key")]
    EmptyKey { line: usize },
}

/// Format one event as a chart line.
pub fn format_line(event: &NoteEvent) -> String {
    format!("{}:{}:{}", format_time(event.time), event.kind.digit(), event.key)
}

/// Six decimals, ties rounded away from zero.
///
/// `{:.6}` already rounds on the exact binary value, but breaks exact ties to
/// even. A value sits exactly halfway between two micro steps only when it is
/// an odd multiple of 1/128, so those are handled separately.
pub fn format_time(time: f64) -> String {
    let eighths = time.abs() * 128.0;
    if eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        let micros = (eighths as u128 * 15_625 + 1) / 2;
        let sign = if time < 0.0 { "-" } else { "" };
        return format!("{sign}{}.{:06}", micros / 1_000_000, micros % 1_000_000);
    }
    format!("{time:.6}")
}

/// Flatten events into chart text, keeping their recorded order.
pub fn serialize(events: &[NoteEvent]) -> String {
    events.iter().map(format_line).collect::<Vec<_>>().join("\n")
}

/// Parse chart text back into events.
///
/// Empty input yields an empty list. A single trailing newline and `\r\n`
/// line endings are accepted.
pub fn deserialize(text: &str) -> Result<Vec<NoteEvent>, ChartError> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    body.split('\n')
        .enumerate()
        .map(|(i, raw)| parse_line(raw.strip_suffix('\r').unwrap_or(raw), i + 1))
        .collect()
}

fn parse_line(line: &str, line_no: usize) -> Result<NoteEvent, ChartError> {
    let mut fields = line.splitn(3, ':');
    let (Some(time), Some(kind), Some(key)) = (fields.next(), fields.next(), fields.next()) else {
        return Err(ChartError::MissingField { line: line_no });
    };

    let time = time
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or_else(|| ChartError::InvalidTime {
            line: line_no,
            value: time.to_string(),
        })?;

    let kind = NoteKind::from_digit(kind).ok_or_else(|| ChartError::InvalidKind {
        line: line_no,
        value: kind.to_string(),
    })?;

    if key.is_empty() {
        return Err(ChartError::EmptyKey { line: line_no });
    }

    Ok(NoteEvent {
        time,
        key: key.to_string(),
        kind,
    })
}
