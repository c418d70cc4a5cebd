//! Shared constants for the canvas crate.

// ── Colors ──────────────────────────────────────────────────────

/// Canvas background. A shape carrying exactly this color is an eraser mark
/// and renders filled / wide instead of outlined.
pub const BACKGROUND_COLOR: &str = "rgba(0, 0, 0)";

/// Draw color used at render time when a shape carries no color.
pub const FOREGROUND_COLOR: &str = "rgba(255, 255, 255)";

// ── Viewport ────────────────────────────────────────────────────

/// Scale multiplier for one wheel tick toward the user (`dy < 0`).
pub const ZOOM_IN_FACTOR: f64 = 1.1;

/// Scale multiplier for one wheel tick away from the user.
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 10.0;

// ── Strokes and text ────────────────────────────────────────────

/// Pencil stroke width in screen pixels.
pub const PENCIL_WIDTH_PX: f64 = 2.0;

/// Eraser stroke width in screen pixels.
pub const ERASER_WIDTH_PX: f64 = 20.0;

/// Font size in world units when a text shape omits `fontSize`.
pub const DEFAULT_FONT_SIZE: f64 = 20.0;

pub const FONT_FAMILY: &str = "sans-serif";

/// Gap between the end of draft text and the caret, in screen pixels.
pub const CARET_GAP_PX: f64 = 2.0;
