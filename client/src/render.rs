use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use inkgallery_shared::{replay_encoded, ColorId, Dimensions, Position, Surface, Tools};

use crate::dom::{context_2d, create};

/// Draws strokes onto a 2d canvas context at the canvas' own resolution.
pub struct CanvasSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl<'a> CanvasSurface<'a> {
    pub fn new(canvas: &HtmlCanvasElement, ctx: &'a CanvasRenderingContext2d) -> Self {
        Self {
            ctx,
            width: canvas.width() as f64,
            height: canvas.height() as f64,
        }
    }
}

impl Surface for CanvasSurface<'_> {
    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn stroke_segment(&mut self, from: Position, to: Position, color: &ColorId, width: f64) {
        let ctx = self.ctx;
        let _ = ctx.set_global_composite_operation("source-over");
        ctx.set_stroke_style_str(color.as_str());
        ctx.set_line_width(width);
        ctx.set_line_cap("round");
        ctx.begin_path();
        ctx.move_to(from.x as f64, from.y as f64);
        ctx.line_to(to.x as f64, to.y as f64);
        ctx.stroke();
    }

    fn erase_dab(&mut self, x: f64, y: f64, radius: f64) {
        let ctx = self.ctx;
        let _ = ctx.set_global_composite_operation("destination-out");
        ctx.begin_path();
        let _ = ctx.arc(x, y, radius, 0.0, PI * 2.0);
        ctx.fill();
        let _ = ctx.set_global_composite_operation("source-over");
    }
}

/// A canvas sized to the full image with its stored drawing replayed onto it.
/// CSS scales it over the thumbnail.
pub fn drawing_overlay(
    document: &Document,
    dimensions: Dimensions,
    encoded: &str,
) -> Result<HtmlCanvasElement, JsValue> {
    let canvas: HtmlCanvasElement = create(document, "canvas", "overlay")?;
    canvas.set_width(dimensions.width);
    canvas.set_height(dimensions.height);
    let ctx = context_2d(&canvas)?;
    let mut surface = CanvasSurface::new(&canvas, &ctx);
    replay_encoded(&mut surface, encoded, &Tools::default());
    Ok(canvas)
}
