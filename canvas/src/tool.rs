//! Shape construction from tool gestures.
//!
//! Pure geometry: given the active tool, the world-space drag endpoints and
//! the user's color, produce the shape a commit would emit. The engine uses
//! the same builders for the live preview so preview and commit never drift.

#[cfg(test)]
#[path = "tool_test.rs"]
mod tool_test;

use crate::consts::BACKGROUND_COLOR;
use crate::input::{EraserMode, Tool};
use crate::shape::Shape;
use crate::viewport::Point;

/// Build the shape for a drag from `start` to `end`. Returns `None` for the
/// text tool, which does not use drags, and for non-finite geometry.
///
/// - rect: `(x, y) = start`, `(width, height) = end - start`
/// - circle: `radius = max(|dx|, |dy|) / 2`, center at the drag midpoint
/// - pencil: one segment `start → end`
/// - eraser: a block rect or a stroke segment in the background color
#[must_use]
pub fn build_drag_shape(tool: Tool, start: Point, end: Point, color: Option<&str>) -> Option<Shape> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let color = color.map(str::to_owned);

    let shape = match tool {
        Tool::Rect => Some(rect(start, dx, dy, color)),
        Tool::Circle => Some(Shape::Circle {
            center_x: start.x + dx / 2.0,
            center_y: start.y + dy / 2.0,
            radius: dx.abs().max(dy.abs()) / 2.0,
            color,
        }),
        Tool::Pencil => Some(segment(start, end, color)),
        Tool::Eraser(EraserMode::Block) => Some(rect(start, dx, dy, Some(BACKGROUND_COLOR.to_owned()))),
        Tool::Eraser(EraserMode::Stroke) => Some(segment(start, end, Some(BACKGROUND_COLOR.to_owned()))),
        Tool::Text => None,
    };
    shape.filter(Shape::is_finite)
}

/// Build a text shape, or `None` when the trimmed content is empty or the
/// anchor is not finite.
#[must_use]
pub fn build_text_shape(anchor: Point, content: &str, color: Option<&str>, font_size: Option<f64>) -> Option<Shape> {
    if content.trim().is_empty() {
        return None;
    }
    Some(Shape::Text {
        x: anchor.x,
        y: anchor.y,
        content: content.to_owned(),
        color: color.map(str::to_owned),
        font_size,
    })
    .filter(Shape::is_finite)
}

fn rect(start: Point, width: f64, height: f64, color: Option<String>) -> Shape {
    Shape::Rect { x: start.x, y: start.y, width, height, color }
}

fn segment(start: Point, end: Point, color: Option<String>) -> Shape {
    Shape::Pencil { start_x: start.x, start_y: start.y, end_x: end.x, end_y: end.y, color }
}
