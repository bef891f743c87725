use anyhow::Result;
use rhy_model::{KeyMap, NoteEvent, pair_spans};
use tracing::trace;

use crate::backend::{Color, Rect, RenderBackend};

/// Geometry and palette of the note track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackConfig {
    /// Vertical stretch applied to `(now - t) / duration`.
    pub scroll_scale: f64,
    /// Spans this far outside the surface are still drawn.
    pub visibility_margin: f32,
    pub note_width: f32,
    pub cap_size: f32,
    /// Distance of the playhead above the bottom edge.
    pub playhead_offset: f32,
    pub playhead_width: f32,
    pub lane_line_width: f32,
    pub background: Color,
    pub lane_color: Color,
    pub playhead_color: Color,
    pub span_head: Color,
    pub span_tail: Color,
    pub cap_color: Color,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            scroll_scale: 20.0,
            visibility_margin: 50.0,
            note_width: 10.0,
            cap_size: 10.0,
            playhead_offset: 10.0,
            playhead_width: 2.0,
            lane_line_width: 1.0,
            background: Color::TRANSPARENT,
            lane_color: Color::WHITE,
            playhead_color: Color::GREEN,
            span_head: Color::RED.with_alpha(0.8),
            span_tail: Color::RED.with_alpha(0.4),
            cap_color: Color::RED,
        }
    }
}

/// Inputs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct TrackFrame<'a> {
    pub events: &'a [NoteEvent],
    pub key_map: &'a KeyMap,
    pub now: f64,
    /// Track length; spans are only drawn once it is known and positive.
    pub duration: Option<f64>,
}

/// Draws lanes, note spans and the playhead.
///
/// Notes scroll upward: an event at time `t` sits at
/// `y = H - ((now - t) / duration) * H * scroll_scale`, so the moment being
/// played is at the bottom edge.
#[derive(Debug, Clone, Default)]
pub struct NoteTrackRenderer {
    config: TrackConfig,
}

impl NoteTrackRenderer {
    pub fn new(config: TrackConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    /// Draw one frame. Returns `false` without drawing if the surface is gone.
    pub fn render<B: RenderBackend + ?Sized>(&self, backend: &mut B, frame: &TrackFrame<'_>) -> Result<bool> {
        let Some((width, height)) = backend.surface_size() else {
            trace!("Note track surface unavailable, skipping frame");
            return Ok(false);
        };
        if width <= 0.0 || height <= 0.0 {
            return Ok(false);
        }
        let cfg = &self.config;
        let lanes = frame.key_map.lane_count();
        let lane_x = |lane: usize| (lane + 1) as f32 * (width / (lanes + 1) as f32);

        backend.begin_frame()?;
        backend.clear(cfg.background)?;

        for lane in 0..lanes {
            let x = lane_x(lane);
            backend.stroke_line((x, 0.0), (x, height), cfg.lane_line_width, cfg.lane_color)?;
        }

        if let Some(duration) = frame.duration.filter(|d| d.is_finite() && *d > 0.0) {
            let y_of = |t: f64| {
                let h = height as f64;
                (h - ((frame.now - t) / duration) * h * cfg.scroll_scale) as f32
            };
            let margin = cfg.visibility_margin;

            for span in pair_spans(frame.events) {
                let Some(lane) = frame.key_map.lane_of(span.key) else {
                    continue;
                };
                let x = lane_x(lane);
                let start_y = y_of(span.start);
                match span.end {
                    Some(end) => {
                        let end_y = y_of(end);
                        if end_y >= -margin && start_y <= height + margin {
                            self.draw_body(backend, x, start_y, end_y)?;
                            backend.fill_rect(Rect::centered(x, start_y, cfg.cap_size), cfg.cap_color)?;
                            backend.fill_rect(Rect::centered(x, end_y, cfg.cap_size), cfg.cap_color)?;
                        }
                    }
                    None => {
                        if start_y <= height + margin {
                            self.draw_body(backend, x, start_y, y_of(frame.now))?;
                            backend.fill_rect(Rect::centered(x, start_y, cfg.cap_size), cfg.cap_color)?;
                        }
                    }
                }
            }
        }

        let playhead_y = height - cfg.playhead_offset;
        backend.stroke_line(
            (0.0, playhead_y),
            (width, playhead_y),
            cfg.playhead_width,
            cfg.playhead_color,
        )?;

        backend.end_frame()?;
        Ok(true)
    }

    /// Gradient body from the press end to the release end.
    fn draw_body<B: RenderBackend + ?Sized>(&self, backend: &mut B, x: f32, start_y: f32, end_y: f32) -> Result<()> {
        let cfg = &self.config;
        let left = x - cfg.note_width / 2.0;
        let (top, bottom, top_color, bottom_color) = if start_y <= end_y {
            (start_y, end_y, cfg.span_head, cfg.span_tail)
        } else {
            (end_y, start_y, cfg.span_tail, cfg.span_head)
        };
        backend.fill_vertical_gradient(
            Rect::new(left, top, cfg.note_width, bottom - top),
            top_color,
            bottom_color,
        )
    }
}
