//! Pan/zoom viewport over the infinite drawing plane.
//!
//! Shapes live in world coordinates. The viewport maps them to screen
//! coordinates (CSS pixels) with one uniform scale and an offset:
//! `screen = world * scale + offset`.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::{MAX_SCALE, MIN_SCALE, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Viewport state. `offset_x` / `offset_y` are in CSS pixels; `scale` is a
/// zoom factor clamped to `[MIN_SCALE, MAX_SCALE]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { offset_x: 0.0, offset_y: 0.0, scale: 1.0 }
    }
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.offset_x) / self.scale,
            y: (screen.y - self.offset_y) / self.scale,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.scale + self.offset_x,
            y: world.y * self.scale + self.offset_y,
        }
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Apply one wheel tick at `anchor` (screen space). Wheel up (`dy < 0`)
    /// zooms in, wheel down zooms out, `dy == 0` does nothing. The world point
    /// under `anchor` stays under it. Returns `true` if the view changed.
    pub fn zoom_at(&mut self, anchor: Point, dy: f64) -> bool {
        if dy == 0.0 || dy.is_nan() {
            return false;
        }
        let factor = if dy < 0.0 { ZOOM_IN_FACTOR } else { ZOOM_OUT_FACTOR };
        let next = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if (next - self.scale).abs() < f64::EPSILON {
            return false;
        }

        let world = self.screen_to_world(anchor);
        self.scale = next;
        self.offset_x = anchor.x - world.x * next;
        self.offset_y = anchor.y - world.y * next;
        true
    }

    /// Convert a screen-space length to world units.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }
}
