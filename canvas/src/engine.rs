use protocol::{ClientMessage, HistoryRecord, RoomId, ServerMessage};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::{DEFAULT_FONT_SIZE, FOREGROUND_COLOR};
use crate::input::{Button, InputState, Key, Modifiers, Tool, UiState, WheelDelta};
use crate::render::{self, Preview, Surface};
use crate::shape::{Shape, ShapeError};
use crate::sync::{ReplayTicket, SyncClient, SyncState};
use crate::tool::{build_drag_shape, build_text_shape};
use crate::viewport::{Point, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

const CURSOR_DEFAULT: &str = "crosshair";
const CURSOR_PANNING: &str = "grabbing";

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Something visible changed; call [`Engine::render`].
    RenderNeeded,
    /// A shape was committed locally. The host sends
    /// [`EngineCore::chat_message`] for it.
    ShapeCommitted(Shape),
    SetCursor(String),
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub viewport: Viewport,
    pub ui: UiState,
    pub input: InputState,
    pub sync: SyncClient,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

impl EngineCore {
    #[must_use]
    pub fn new(room_id: RoomId) -> Self {
        Self {
            viewport: Viewport::default(),
            ui: UiState::default(),
            input: InputState::default(),
            sync: SyncClient::new(room_id),
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
        }
    }

    // --- Tool / color ---

    /// Set the active tool. An in-progress drag or text draft is discarded.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.ui.tool = tool;
        if matches!(self.input, InputState::Dragging { .. } | InputState::Composing { .. }) {
            self.input = InputState::Idle;
            return vec![Action::RenderNeeded];
        }
        Vec::new()
    }

    /// Set the draw color. `None` leaves future shapes uncolored.
    pub fn set_color(&mut self, color: Option<String>) -> Vec<Action> {
        self.ui.color = color;
        if matches!(self.input, InputState::Idle | InputState::Panning { .. }) {
            Vec::new()
        } else {
            vec![Action::RenderNeeded]
        }
    }

    /// Update surface dimensions (CSS pixels) and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        vec![Action::RenderNeeded]
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button.starts_pan(modifiers) {
            // A pan would lose the draft; keep composing instead.
            if matches!(self.input, InputState::Composing { .. }) {
                return Vec::new();
            }
            self.input = InputState::Panning { last_screen: screen_pt };
            return vec![Action::SetCursor(CURSOR_PANNING.into())];
        }

        let world = self.viewport.screen_to_world(screen_pt);
        if self.ui.tool.is_drag_tool() {
            self.input = InputState::Dragging { start: world, current: world };
            return vec![Action::RenderNeeded];
        }

        // Text tool: a click while composing commits the draft and re-anchors.
        let mut actions = match std::mem::take(&mut self.input) {
            InputState::Composing { anchor, draft } => self.commit_text(anchor, &draft),
            _ => Vec::new(),
        };
        self.input = InputState::Composing { anchor: world, draft: String::new() };
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        match &mut self.input {
            InputState::Panning { last_screen } => {
                let (dx, dy) = (screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                *last_screen = screen_pt;
                self.viewport.pan_by(dx, dy);
                vec![Action::RenderNeeded]
            }
            InputState::Dragging { current, .. } => {
                *current = self.viewport.screen_to_world(screen_pt);
                vec![Action::RenderNeeded]
            }
            InputState::Idle | InputState::Composing { .. } => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Panning { .. } => vec![Action::SetCursor(CURSOR_DEFAULT.into())],
            InputState::Dragging { start, .. } => {
                let end = self.viewport.screen_to_world(screen_pt);
                match build_drag_shape(self.ui.tool, start, end, self.ui.color.as_deref()) {
                    Some(shape) => self.commit(shape),
                    None => vec![Action::RenderNeeded],
                }
            }
            composing @ InputState::Composing { .. } => {
                self.input = composing;
                Vec::new()
            }
            InputState::Idle => Vec::new(),
        }
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        if self.viewport.zoom_at(screen_pt, delta.dy) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Keyboard input. Only meaningful while composing text.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let InputState::Composing { anchor, draft } = &mut self.input else {
            return Vec::new();
        };

        match key.0.as_str() {
            "Enter" => {
                let (anchor, draft) = (*anchor, std::mem::take(draft));
                self.input = InputState::Idle;
                let mut actions = self.commit_text(anchor, &draft);
                actions.push(Action::RenderNeeded);
                actions
            }
            "Escape" => {
                self.input = InputState::Idle;
                vec![Action::RenderNeeded]
            }
            "Backspace" => {
                if draft.pop().is_some() { vec![Action::RenderNeeded] } else { Vec::new() }
            }
            _ => match key.printable() {
                Some(c) if !(modifiers.ctrl || modifiers.meta) => {
                    draft.push(c);
                    vec![Action::RenderNeeded]
                }
                _ => Vec::new(),
            },
        }
    }

    // --- Sync ---

    /// See [`SyncClient::connection_opened`].
    pub fn connection_opened(&mut self) -> ReplayTicket {
        self.sync.connection_opened()
    }

    #[must_use]
    pub fn join_message(&self) -> ClientMessage {
        self.sync.join_message()
    }

    pub fn mark_joined(&mut self, ticket: ReplayTicket) -> Vec<Action> {
        render_if(self.sync.mark_joined(ticket))
    }

    pub fn complete_replay(&mut self, ticket: ReplayTicket, history: &[HistoryRecord]) -> Vec<Action> {
        render_if(self.sync.complete_replay(ticket, history))
    }

    pub fn receive(&mut self, message: &ServerMessage) -> Vec<Action> {
        render_if(self.sync.receive(message))
    }

    pub fn connection_lost(&mut self) {
        self.sync.connection_lost();
    }

    /// The outbound `chat` message for a committed shape.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if the shape cannot be encoded.
    pub fn chat_message(&self, shape: &Shape) -> Result<ClientMessage, ShapeError> {
        self.sync.chat_message(shape)
    }

    // --- Queries ---

    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        self.sync.shapes()
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    /// The uncommitted part of the scene for the renderer.
    #[must_use]
    pub fn preview(&self) -> Option<Preview> {
        match &self.input {
            InputState::Dragging { start, current } => {
                build_drag_shape(self.ui.tool, *start, *current, self.ui.color.as_deref()).map(Preview::Shape)
            }
            InputState::Composing { anchor, draft } => Some(Preview::Text {
                anchor: *anchor,
                draft: draft.clone(),
                color: self.ui.color.clone().unwrap_or_else(|| FOREGROUND_COLOR.to_owned()),
                font_size: DEFAULT_FONT_SIZE,
            }),
            InputState::Idle | InputState::Panning { .. } => None,
        }
    }

    #[must_use]
    pub fn surface(&self) -> Surface {
        Surface { width: self.viewport_width, height: self.viewport_height, dpr: self.dpr }
    }

    // --- Internals ---

    fn commit(&mut self, shape: Shape) -> Vec<Action> {
        self.sync.apply_local(shape.clone());
        vec![Action::ShapeCommitted(shape), Action::RenderNeeded]
    }

    fn commit_text(&mut self, anchor: Point, draft: &str) -> Vec<Action> {
        match build_text_shape(anchor, draft, self.ui.color.as_deref(), None) {
            Some(shape) => self.commit(shape),
            None => Vec::new(),
        }
    }
}

fn render_if(changed: bool) -> Vec<Action> {
    if changed { vec![Action::RenderNeeded] } else { Vec::new() }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element, showing `room_id`.
    ///
    /// # Errors
    ///
    /// Returns the browser's error if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, room_id: RoomId) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)?;
        Ok(Self { canvas, ctx, core: EngineCore::new(room_id) })
    }

    /// Resize the backing store to `width_css * dpr` by `height_css * dpr`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        let actions = self.core.set_viewport(width_css, height_css, dpr);
        self.canvas.set_width((width_css * self.core.dpr).round().max(0.0) as u32);
        self.canvas.set_height((height_css * self.core.dpr).round().max(0.0) as u32);
        actions
    }

    // --- Delegated input ---

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.core.set_tool(tool)
    }

    pub fn set_color(&mut self, color: Option<String>) -> Vec<Action> {
        self.core.set_color(color)
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns the browser's error if a drawing call fails.
    pub fn render(&mut self) -> Result<(), JsValue> {
        let preview = self.core.preview();
        render::draw(
            &mut self.ctx,
            self.core.sync.shapes(),
            &self.core.viewport,
            preview.as_ref(),
            self.core.surface(),
        )
    }
}
