//! Drawing surface abstraction.
//!
//! The scene only needs to clear the frame and stroke polylines; each
//! front-end maps these onto its own renderer (Canvas 2D on the web, a wgpu
//! line batch natively).

use glam::Vec2;

/// 8-bit RGB with a floating point alpha, matching CSS `rgba()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// CSS color string, e.g. `rgba(230, 240, 255, 0.5)`.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }

    /// Normalized linear components for GPU vertex colors; alpha is clamped
    /// to `[0, 1]`.
    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a.clamp(0.0, 1.0),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineJoin {
    Bevel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub line_width: f32,
    /// `None` leaves the surface's current join untouched.
    pub line_join: Option<LineJoin>,
}

pub trait DrawingSurface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn clear(&mut self, color: Rgba);
    fn stroke_polyline(&mut self, points: &[Vec2], style: &StrokeStyle);
}
