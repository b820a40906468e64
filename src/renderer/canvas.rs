//! Canvas2D painter

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::scene::{DrawCmd, Scene};
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};

pub struct CanvasPainter {
    ctx: CanvasRenderingContext2d,
    /// Device pixels per field unit
    scale: f64,
    /// Letterbox offset in device pixels
    offset: (f64, f64),
    dpr: f64,
}

impl CanvasPainter {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        let mut painter = Self {
            ctx,
            scale: 1.0,
            offset: (0.0, 0.0),
            dpr: 1.0,
        };
        painter.resize(canvas);
        Ok(painter)
    }

    /// Match the backing store to the element size and refit the field
    pub fn resize(&mut self, canvas: &HtmlCanvasElement) {
        self.dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let width = (canvas.client_width() as f64 * self.dpr).max(1.0);
        let height = (canvas.client_height() as f64 * self.dpr).max(1.0);
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);

        self.scale = (width / FIELD_WIDTH as f64).min(height / FIELD_HEIGHT as f64);
        self.offset = (
            (width - FIELD_WIDTH as f64 * self.scale) / 2.0,
            (height - FIELD_HEIGHT as f64 * self.scale) / 2.0,
        );
    }

    /// CSS pixel position (relative to the canvas) to field units
    pub fn to_field(&self, x: f64, y: f64) -> (f32, f32) {
        (
            ((x * self.dpr - self.offset.0) / self.scale) as f32,
            ((y * self.dpr - self.offset.1) / self.scale) as f32,
        )
    }

    pub fn paint(&self, scene: &Scene) {
        let ctx = &self.ctx;
        ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();

        for cmd in &scene.commands {
            match cmd {
                DrawCmd::Clear(color) => {
                    let canvas_w = ctx.canvas().map_or(0, |c| c.width()) as f64;
                    let canvas_h = ctx.canvas().map_or(0, |c| c.height()) as f64;
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.fill_rect(0.0, 0.0, canvas_w, canvas_h);
                    // Field space from here on
                    ctx.set_transform(self.scale, 0.0, 0.0, self.scale, self.offset.0, self.offset.1)
                        .ok();
                }
                DrawCmd::Rect { min, size, color } => {
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.fill_rect(min.x as f64, min.y as f64, size.x as f64, size.y as f64);
                }
                DrawCmd::Circle {
                    center,
                    radius,
                    color,
                } => {
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.begin_path();
                    ctx.arc(
                        center.x as f64,
                        center.y as f64,
                        *radius as f64,
                        0.0,
                        std::f64::consts::TAU,
                    )
                    .ok();
                    ctx.fill();
                }
                DrawCmd::DashedLine {
                    from,
                    to,
                    dash,
                    color,
                } => {
                    let pattern = js_sys::Array::of2(&(*dash as f64).into(), &(*dash as f64).into());
                    ctx.set_line_dash(&pattern).ok();
                    ctx.set_stroke_style_str(&color.to_css());
                    ctx.set_line_width(3.0);
                    ctx.begin_path();
                    ctx.move_to(from.x as f64, from.y as f64);
                    ctx.line_to(to.x as f64, to.y as f64);
                    ctx.stroke();
                    ctx.set_line_dash(&js_sys::Array::new()).ok();
                }
                DrawCmd::Text {
                    pos,
                    text,
                    size,
                    align,
                    color,
                } => {
                    ctx.set_font(&format!("{}px 'Fira Code', monospace", size));
                    ctx.set_text_align(align.as_css());
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.fill_text(text, pos.x as f64, pos.y as f64).ok();
                }
            }
        }
    }
}
