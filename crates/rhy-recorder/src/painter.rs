use anyhow::{Result, bail};
use egui::{Color32, Mesh, Painter, Pos2, Shape, Stroke};
use rhy_render::{Color, Rect, RenderBackend};

/// [`RenderBackend`] drawing into an egui painter. Coordinates are relative
/// to `rect`.
pub struct EguiPainter<'a> {
    painter: &'a Painter,
    rect: egui::Rect,
    in_frame: bool,
}

impl<'a> EguiPainter<'a> {
    pub fn new(painter: &'a Painter, rect: egui::Rect) -> Self {
        Self {
            painter,
            rect,
            in_frame: false,
        }
    }

    fn to_screen(&self, (x, y): (f32, f32)) -> Pos2 {
        to_screen(self.rect, x, y)
    }

    fn check_frame(&self) -> Result<()> {
        if !self.in_frame {
            bail!("draw call outside begin_frame/end_frame");
        }
        Ok(())
    }
}

fn to_screen(rect: egui::Rect, x: f32, y: f32) -> Pos2 {
    Pos2::new(rect.min.x + x, rect.min.y + y)
}

fn color32(color: Color) -> Color32 {
    let [r, g, b, a] = color.to_rgba8();
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

impl RenderBackend for EguiPainter<'_> {
    fn surface_size(&self) -> Option<(f32, f32)> {
        let (w, h) = (self.rect.width(), self.rect.height());
        (w > 0.0 && h > 0.0).then_some((w, h))
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.in_frame = true;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.check_frame()?;
        self.in_frame = false;
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.check_frame()?;
        if color.a > 0.0 {
            self.painter.rect_filled(self.rect, 0.0, color32(color));
        }
        Ok(())
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) -> Result<()> {
        self.check_frame()?;
        self.painter.line_segment(
            [self.to_screen(from), self.to_screen(to)],
            Stroke::new(width, color32(color)),
        );
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.check_frame()?;
        let min = self.to_screen((rect.x, rect.y));
        let area = egui::Rect::from_min_size(min, egui::vec2(rect.w, rect.h));
        self.painter.rect_filled(area, 0.0, color32(color));
        Ok(())
    }

    fn fill_vertical_gradient(&mut self, rect: Rect, top: Color, bottom: Color) -> Result<()> {
        self.check_frame()?;
        let (top, bottom) = (color32(top), color32(bottom));
        let mut mesh = Mesh::default();
        mesh.colored_vertex(self.to_screen((rect.x, rect.y)), top);
        mesh.colored_vertex(self.to_screen((rect.x + rect.w, rect.y)), top);
        mesh.colored_vertex(self.to_screen((rect.x + rect.w, rect.bottom())), bottom);
        mesh.colored_vertex(self.to_screen((rect.x, rect.bottom())), bottom);
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        self.painter.add(Shape::mesh(mesh));
        Ok(())
    }
}
