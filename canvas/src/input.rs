//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InputState` is the active gesture tracked between pointer-down and
//! pointer-up (or, for text, between the anchoring click and Enter/Escape).

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::viewport::Point;

/// How the eraser paints over existing shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EraserMode {
    /// Filled background-colored rectangle.
    #[default]
    Block,
    /// Wide background-colored segment.
    Stroke,
}

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Drag out a rectangle.
    Rect,
    /// Drag out a circle (default).
    #[default]
    Circle,
    /// Drag a straight segment.
    Pencil,
    /// Click to anchor, type, Enter to commit.
    Text,
    /// Paint over with the background color.
    Eraser(EraserMode),
}

impl Tool {
    /// Parse a host tool name: `rect`, `circle`, `pencil`, `text`, `eraser`
    /// (block mode) or `eraser-stroke`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rect" => Some(Self::Rect),
            "circle" => Some(Self::Circle),
            "pencil" => Some(Self::Pencil),
            "text" => Some(Self::Text),
            "eraser" | "eraser-block" => Some(Self::Eraser(EraserMode::Block)),
            "eraser-stroke" => Some(Self::Eraser(EraserMode::Stroke)),
            _ => None,
        }
    }

    /// Whether this tool builds its shape from a pointer drag.
    #[must_use]
    pub fn is_drag_tool(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    /// Alt / Option key. With the primary button it pans instead of drawing.
    pub alt: bool,
    pub meta: bool,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }

    /// Whether pressing this button (with these modifiers) starts a pan.
    #[must_use]
    pub fn starts_pan(self, modifiers: Modifiers) -> bool {
        match self {
            Self::Middle | Self::Secondary => true,
            Self::Primary => modifiers.alt,
        }
    }
}

/// A keyboard key as reported by the browser (`KeyboardEvent.key`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    /// The key's character if it types exactly one printable character.
    #[must_use]
    pub fn printable(&self) -> Option<char> {
        let mut chars = self.0.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Some(c),
            _ => None,
        }
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently active drawing tool.
    pub tool: Tool,
    /// User-chosen draw color. `None` leaves shapes uncolored so they take the
    /// foreground default at render time.
    pub color: Option<String>,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the canvas.
    Panning {
        /// Screen-space position of the previous pointer event, used to compute pan delta.
        last_screen: Point,
    },
    /// The user is dragging out a rect, circle, pencil segment or eraser mark.
    Dragging {
        /// World-space point where the drag started.
        start: Point,
        /// World-space point of the latest pointer event.
        current: Point,
    },
    /// The user is typing text anchored at a world-space baseline point.
    Composing {
        anchor: Point,
        draft: String,
    },
}
