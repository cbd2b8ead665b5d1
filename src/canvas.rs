use stormlines_core::{DrawingSurface, LineJoin, Rgba, StrokeStyle, Vec2};
use wasm_bindgen::JsCast;
use web_sys as web;

/// [`DrawingSurface`] over a 2D canvas context.
pub struct Canvas2d {
    canvas: web::HtmlCanvasElement,
    ctx: web::CanvasRenderingContext2d,
}

impl Canvas2d {
    /// Create a `width`×`height` canvas and append it to `parent`.
    pub fn create(
        document: &web::Document,
        parent: &web::HtmlElement,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        let canvas: web::HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| anyhow::anyhow!("{:?}", e))?
            .dyn_into()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        canvas.set_width(width);
        canvas.set_height(height);
        parent
            .append_child(&canvas)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;

        let ctx: web::CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|e| anyhow::anyhow!("{:?}", e))?
            .ok_or_else(|| anyhow::anyhow!("2d context unavailable"))?
            .dyn_into()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(Self { canvas, ctx })
    }
}

fn join_name(join: LineJoin) -> &'static str {
    match join {
        LineJoin::Bevel => "bevel",
    }
}

impl DrawingSurface for Canvas2d {
    fn width(&self) -> f32 {
        self.canvas.width() as f32
    }

    fn height(&self) -> f32 {
        self.canvas.height() as f32
    }

    fn clear(&mut self, color: Rgba) {
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        self.ctx.clear_rect(0.0, 0.0, w, h);
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(0.0, 0.0, w, h);
    }

    fn stroke_polyline(&mut self, points: &[Vec2], style: &StrokeStyle) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.set_stroke_style_str(&style.color.to_css());
        self.ctx.set_line_width(style.line_width as f64);
        if let Some(join) = style.line_join {
            self.ctx.set_line_join(join_name(join));
        }
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.stroke();
    }
}
