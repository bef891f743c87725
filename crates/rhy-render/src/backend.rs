use anyhow::Result;

/// Color with RGBA components (0.0..=1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// CSS `green` (#008000).
    pub const GREEN: Self = Self::new(0.0, 128.0 / 255.0, 0.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Components as 8-bit unmultiplied RGBA.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Axis-aligned rectangle in surface pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Square of side `size` centered on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, size: f32) -> Self {
        Self::new(cx - size / 2.0, cy - size / 2.0, size, size)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// Abstraction over 2D drawing surfaces.
/// Implementations: the egui painter (production), CommandRecorder (testing).
pub trait RenderBackend {
    /// Surface size in pixels, or `None` if there is nothing to draw on.
    fn surface_size(&self) -> Option<(f32, f32)>;

    fn begin_frame(&mut self) -> Result<()>;
    fn end_frame(&mut self) -> Result<()>;

    fn clear(&mut self, color: Color) -> Result<()>;
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) -> Result<()>;
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()>;

    /// Fill `rect` blending from `top` at its upper edge to `bottom` at its lower edge.
    fn fill_vertical_gradient(&mut self, rect: Rect, top: Color, bottom: Color) -> Result<()>;
}
