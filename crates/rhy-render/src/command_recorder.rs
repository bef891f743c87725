use anyhow::{Result, bail};

use crate::backend::{Color, Rect, RenderBackend};

/// Recorded draw command for testing.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginFrame,
    EndFrame,
    Clear(Color),
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Color,
    },
    Rect {
        rect: Rect,
        color: Color,
    },
    Gradient {
        rect: Rect,
        top: Color,
        bottom: Color,
    },
}

/// A mock RenderBackend that records draw commands for snapshot testing.
/// Does not require a GPU or a window.
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
    size: Option<(f32, f32)>,
    in_frame: bool,
}

impl CommandRecorder {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            commands: Vec::new(),
            size: Some((width, height)),
            in_frame: false,
        }
    }

    /// A recorder standing in for a surface that has gone away.
    pub fn unavailable() -> Self {
        Self {
            commands: Vec::new(),
            size: None,
            in_frame: false,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
    }

    pub fn rects(&self) -> impl Iterator<Item = (Rect, Color)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Rect { rect, color } => Some((*rect, *color)),
            _ => None,
        })
    }

    pub fn gradients(&self) -> impl Iterator<Item = Rect> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Gradient { rect, .. } => Some(*rect),
            _ => None,
        })
    }

    fn push(&mut self, command: DrawCommand) -> Result<()> {
        if !self.in_frame {
            bail!("draw outside of frame: {command:?}");
        }
        self.commands.push(command);
        Ok(())
    }
}

impl RenderBackend for CommandRecorder {
    fn surface_size(&self) -> Option<(f32, f32)> {
        self.size
    }

    fn begin_frame(&mut self) -> Result<()> {
        if self.size.is_none() {
            bail!("surface unavailable");
        }
        self.in_frame = true;
        self.commands.push(DrawCommand::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.push(DrawCommand::EndFrame)?;
        self.in_frame = false;
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.push(DrawCommand::Clear(color))
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) -> Result<()> {
        self.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
        })
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.push(DrawCommand::Rect { rect, color })
    }

    fn fill_vertical_gradient(&mut self, rect: Rect, top: Color, bottom: Color) -> Result<()> {
        self.push(DrawCommand::Gradient { rect, top, bottom })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut rec = CommandRecorder::new(800.0, 400.0);
        rec.begin_frame().unwrap();
        rec.clear(Color::TRANSPARENT).unwrap();
        rec.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::RED).unwrap();
        rec.end_frame().unwrap();

        assert_eq!(rec.commands().len(), 4);
        assert_eq!(rec.commands()[0], DrawCommand::BeginFrame);
        assert_eq!(rec.commands()[3], DrawCommand::EndFrame);
        assert_eq!(rec.rects().count(), 1);
    }

    #[test]
    fn draw_outside_frame_is_an_error() {
        let mut rec = CommandRecorder::new(10.0, 10.0);
        assert!(rec.clear(Color::WHITE).is_err());
        assert!(rec.commands().is_empty());
    }

    #[test]
    fn unavailable_surface_refuses_frames() {
        let mut rec = CommandRecorder::unavailable();
        assert_eq!(rec.surface_size(), None);
        assert!(rec.begin_frame().is_err());
        assert!(rec.commands().is_empty());
    }
}
