//! Rendering: draws the full scene through a [`Painter`].
//!
//! [`draw`] is a pure function of (shapes, viewport, preview, surface size).
//! It owns no state and mutates none. The browser's
//! [`web_sys::CanvasRenderingContext2d`] implements [`Painter`]; tests use a
//! recording painter.
//!
//! Layers, bottom first:
//! 1. background fill over the whole surface (device pixel ratio applied)
//! 2. committed shapes in list order, under one scale/offset transform
//! 3. the in-progress preview (drag shape, or text draft with caret)

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::consts::{BACKGROUND_COLOR, CARET_GAP_PX, ERASER_WIDTH_PX, FONT_FAMILY, PENCIL_WIDTH_PX};
use crate::shape::Shape;
use crate::viewport::{Point, Viewport};

/// The subset of the 2D canvas API the renderer uses.
pub trait Painter {
    type Error;

    /// Replace the current transform with `[a c e; b d f]`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the transform is rejected.
    #[allow(clippy::many_single_char_names)]
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), Self::Error>;
    fn set_fill_style(&mut self, color: &str);
    fn set_stroke_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: &str);
    fn set_font(&mut self, font: &str);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    /// Add a full circle to the current path.
    ///
    /// # Errors
    ///
    /// Returns the backend's error for a negative radius.
    fn circle(&mut self, x: f64, y: f64, radius: f64) -> Result<(), Self::Error>;
    fn stroke(&mut self);
    fn fill(&mut self);
    /// # Errors
    ///
    /// Returns the backend's error if text cannot be drawn.
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), Self::Error>;
    /// Width of `text` in the current font, in current transform units.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if text cannot be measured.
    fn measure_text(&mut self, text: &str) -> Result<f64, Self::Error>;
}

impl Painter for CanvasRenderingContext2d {
    type Error = JsValue;

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::set_transform(self, a, b, c, d, e, f)
    }

    fn set_fill_style(&mut self, color: &str) {
        self.set_fill_style_str(color);
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.set_stroke_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        CanvasRenderingContext2d::set_line_width(self, width);
    }

    fn set_line_cap(&mut self, cap: &str) {
        CanvasRenderingContext2d::set_line_cap(self, cap);
    }

    fn set_font(&mut self, font: &str) {
        CanvasRenderingContext2d::set_font(self, font);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::stroke_rect(self, x, y, w, h);
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64) -> Result<(), JsValue> {
        self.arc(x, y, radius, 0.0, 2.0 * PI)
    }

    fn stroke(&mut self) {
        CanvasRenderingContext2d::stroke(self);
    }

    fn fill(&mut self) {
        CanvasRenderingContext2d::fill(self);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::fill_text(self, text, x, y)
    }

    fn measure_text(&mut self, text: &str) -> Result<f64, JsValue> {
        CanvasRenderingContext2d::measure_text(self, text).map(|m| m.width())
    }
}

/// The in-progress, uncommitted part of the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    /// The shape the current drag would commit.
    Shape(Shape),
    /// Text being composed, drawn with a caret after it.
    Text {
        anchor: Point,
        draft: String,
        color: String,
        font_size: f64,
    },
}

/// Surface size in CSS pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

/// Draw the full scene.
///
/// # Errors
///
/// Returns the painter's error if any fallible drawing call fails.
pub fn draw<P: Painter>(
    painter: &mut P,
    shapes: &[Shape],
    viewport: &Viewport,
    preview: Option<&Preview>,
    surface: Surface,
) -> Result<(), P::Error> {
    let dpr = surface.dpr;

    // Layer 1: background.
    painter.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    painter.set_fill_style(BACKGROUND_COLOR);
    painter.fill_rect(0.0, 0.0, surface.width, surface.height);

    // Layer 2: shapes in world space.
    let scale = viewport.scale * dpr;
    painter.set_transform(scale, 0.0, 0.0, scale, viewport.offset_x * dpr, viewport.offset_y * dpr)?;
    for shape in shapes {
        draw_shape(painter, shape, viewport.scale)?;
    }

    // Layer 3: preview.
    match preview {
        Some(Preview::Shape(shape)) => draw_shape(painter, shape, viewport.scale)?,
        Some(Preview::Text { anchor, draft, color, font_size }) => {
            draw_text_draft(painter, *anchor, draft, color, *font_size, viewport.scale)?;
        }
        None => {}
    }

    Ok(())
}

// =============================================================
// Shape renderers
// =============================================================

/// Draw one shape in world coordinates. `scale` keeps stroke widths constant
/// on screen.
fn draw_shape<P: Painter>(painter: &mut P, shape: &Shape, scale: f64) -> Result<(), P::Error> {
    let color = shape.resolved_color();
    let erase = shape.is_background_colored();
    painter.set_fill_style(color);
    painter.set_stroke_style(color);
    painter.set_line_width(PENCIL_WIDTH_PX / scale);

    match shape {
        Shape::Rect { x, y, width, height, .. } => {
            if erase {
                painter.fill_rect(*x, *y, *width, *height);
            } else {
                painter.stroke_rect(*x, *y, *width, *height);
            }
        }
        Shape::Circle { center_x, center_y, radius, .. } => {
            painter.begin_path();
            painter.circle(*center_x, *center_y, radius.abs())?;
            if erase {
                painter.fill();
            } else {
                painter.stroke();
            }
        }
        Shape::Pencil { start_x, start_y, end_x, end_y, .. } => {
            let width = if erase { ERASER_WIDTH_PX } else { PENCIL_WIDTH_PX };
            painter.set_line_width(width / scale);
            painter.set_line_cap("round");
            painter.begin_path();
            painter.move_to(*start_x, *start_y);
            painter.line_to(*end_x, *end_y);
            painter.stroke();
        }
        Shape::Text { x, y, content, .. } => {
            let size = shape.font_size().unwrap_or_default();
            painter.set_font(&font(size));
            painter.fill_text(content, *x, *y)?;
        }
    }
    Ok(())
}

fn draw_text_draft<P: Painter>(
    painter: &mut P,
    anchor: Point,
    draft: &str,
    color: &str,
    font_size: f64,
    scale: f64,
) -> Result<(), P::Error> {
    painter.set_fill_style(color);
    painter.set_stroke_style(color);
    painter.set_font(&font(font_size));
    painter.fill_text(draft, anchor.x, anchor.y)?;

    let caret_x = anchor.x + painter.measure_text(draft)? + CARET_GAP_PX / scale;
    painter.set_line_width(PENCIL_WIDTH_PX / scale);
    painter.begin_path();
    painter.move_to(caret_x, anchor.y - font_size);
    painter.line_to(caret_x, anchor.y + font_size * 0.2);
    painter.stroke();
    Ok(())
}

/// CSS font shorthand for a text shape.
#[must_use]
pub fn font(size: f64) -> String {
    format!("{size}px {FONT_FAMILY}")
}
