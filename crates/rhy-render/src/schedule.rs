/// Decides when the note track needs repainting.
///
/// While playing every frame is drawn. While paused a frame is drawn only
/// after something changed (events, media, surface size).
#[derive(Debug, Clone)]
pub struct RenderSchedule {
    dirty: bool,
}

impl RenderSchedule {
    pub fn new() -> Self {
        Self { dirty: true }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether to draw this frame. Consumes the pending change.
    pub fn should_render(&mut self, is_playing: bool) -> bool {
        let render = is_playing || self.dirty;
        self.dirty = false;
        render
    }
}

impl Default for RenderSchedule {
    fn default() -> Self {
        Self::new()
    }
}
