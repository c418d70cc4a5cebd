//! Browser export: binds an [`Engine`] to a canvas element and the room socket.
//!
//! DESIGN
//! ======
//! `SketchHost` is the only wasm-bindgen export. It installs pointer, wheel
//! and key listeners on the canvas and runs the socket on the page's task
//! queue:
//! - DOM event → engine → [`plan`] → `chat` text onto the socket, cursor, redraw
//! - Socket text (or UTF-8 binary) → [`receive_text`] → redraw
//! - History fetch → `complete_replay` with the ticket of its connection
//!
//! There is no automatic retry. After a disconnect the page calls `connect`
//! again, which starts a fresh replay. A superseded connection never touches
//! the engine once a newer one has started.
//!
//! ```js
//! const host = new SketchHost(canvas, "42", token);
//! host.resize(canvas.clientWidth, canvas.clientHeight, devicePixelRatio);
//! host.connect();
//! host.set_tool("rect");
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use gloo_net::http::Request;
use gloo_net::websocket::Message;
use gloo_net::websocket::futures::WebSocket;
use protocol::{HistoryResponse, RoomId};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, PointerEvent, WheelEvent};

use crate::engine::{Action, Engine};
use crate::host::{HostError, history_path, join_text, plan, receive_text, ws_url};
use crate::input::{Button, InputState, Key, Modifiers, Tool, WheelDelta};
use crate::sync::{ReplayTicket, SyncState};
use crate::viewport::Point;

type Handler<E> = fn(&mut Shared, &E) -> Vec<Action>;

/// State shared between the listeners and the connection task.
struct Shared {
    engine: Engine,
    canvas: HtmlCanvasElement,
    outbound: Option<mpsc::UnboundedSender<String>>,
    /// Ticket of the connection that currently owns the socket.
    current: Option<ReplayTicket>,
}

impl Shared {
    fn apply(&mut self, actions: Vec<Action>) {
        let plan = plan(&self.engine.core, actions);

        for (shape, error) in &plan.unsent {
            warn(&format!("sketch: shape kept locally, not sent: {error} ({shape:?})"));
        }
        for text in plan.outbound {
            match &self.outbound {
                Some(tx) => {
                    if let Err(e) = tx.unbounded_send(text) {
                        warn(&format!("sketch: socket queue closed: {e}"));
                    }
                }
                None => warn("sketch: offline, shape kept locally"),
            }
        }
        if let Some(cursor) = plan.cursor {
            if let Err(e) = self.canvas.style().set_property("cursor", &cursor) {
                warn_js("sketch: cursor update failed", &e);
            }
        }
        if plan.render {
            self.render();
        }
    }

    fn render(&mut self) {
        if let Err(e) = self.engine.render() {
            warn_js("sketch: render failed", &e);
        }
    }
}

/// A sketch canvas bound to one room.
#[wasm_bindgen]
pub struct SketchHost {
    shared: Rc<RefCell<Shared>>,
    room_id: RoomId,
    token: String,
    listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

#[wasm_bindgen]
impl SketchHost {
    /// Attach to `canvas` for the room `room_id` (decimal string), using
    /// `token` as the credential for the socket and the history fetch.
    ///
    /// # Errors
    ///
    /// Rejects a non-positive room id or a canvas without a 2D context.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, room_id: &str, token: String) -> Result<SketchHost, JsValue> {
        let room_id =
            protocol::parse_room_id(room_id).ok_or_else(|| JsValue::from_str("room id must be a positive integer"))?;
        // Focusable, so key events reach the text tool.
        canvas.set_tab_index(0);
        let engine = Engine::new(canvas.clone(), room_id)?;
        let shared = Rc::new(RefCell::new(Shared { engine, canvas, outbound: None, current: None }));

        let mut host = Self { shared, room_id, token, listeners: Vec::new() };
        host.listen::<PointerEvent>("pointerdown", on_pointer_down)?;
        host.listen::<PointerEvent>("pointermove", |shared, ev| shared.engine.on_pointer_move(screen_point(ev), modifiers(ev)))?;
        host.listen::<PointerEvent>("pointerup", on_pointer_up)?;
        host.listen::<WheelEvent>("wheel", on_wheel)?;
        host.listen::<KeyboardEvent>("keydown", on_key_down)?;
        host.listen::<MouseEvent>("contextmenu", |_, ev| {
            ev.prevent_default();
            Vec::new()
        })?;
        Ok(host)
    }

    /// Open the room socket and replay history. Calling it again reconnects;
    /// the previous socket is abandoned and its replay ignored.
    ///
    /// # Errors
    ///
    /// Fails when the page location cannot be read.
    pub fn connect(&self) -> Result<(), JsValue> {
        let location = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?.location();
        let token = String::from(js_sys::encode_uri_component(&self.token));
        let url = ws_url(&location.protocol()?, &location.host()?, &token);
        wasm_bindgen_futures::spawn_local(run_connection(
            Rc::clone(&self.shared),
            url,
            history_path(self.room_id),
            self.token.clone(),
        ));
        Ok(())
    }

    /// Switch tools by name (`rect`, `circle`, `pencil`, `text`, `eraser`,
    /// `eraser-stroke`). Returns `false` for an unknown name.
    pub fn set_tool(&self, name: &str) -> bool {
        let Some(tool) = Tool::from_name(name) else {
            return false;
        };
        let mut shared = self.shared.borrow_mut();
        let actions = shared.engine.set_tool(tool);
        shared.apply(actions);
        true
    }

    /// Set the draw color. `undefined` leaves new shapes uncolored.
    pub fn set_color(&self, color: Option<String>) {
        let mut shared = self.shared.borrow_mut();
        let actions = shared.engine.set_color(color);
        shared.apply(actions);
    }

    /// Size the canvas in CSS pixels at the given device pixel ratio.
    pub fn resize(&self, width_css: f64, height_css: f64, dpr: f64) {
        let mut shared = self.shared.borrow_mut();
        let actions = shared.engine.set_viewport(width_css, height_css, dpr);
        shared.apply(actions);
    }

    /// Connection phase: `disconnected`, `replaying`, `live` or `reconnecting`.
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        match self.shared.borrow().engine.core.sync_state() {
            SyncState::Disconnected => "disconnected",
            SyncState::Replaying => "replaying",
            SyncState::Live => "live",
            SyncState::Reconnecting => "reconnecting",
        }
        .to_owned()
    }

    #[wasm_bindgen(getter)]
    pub fn shape_count(&self) -> usize {
        self.shared.borrow().engine.core.shapes().len()
    }
}

impl SketchHost {
    fn listen<E: JsCast + 'static>(&mut self, name: &'static str, handler: Handler<E>) -> Result<(), JsValue> {
        let shared = Rc::clone(&self.shared);
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(event) = event.dyn_ref::<E>() else {
                return;
            };
            let mut shared = shared.borrow_mut();
            let actions = handler(&mut shared, event);
            shared.apply(actions);
        });
        self.shared.borrow().canvas.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
        self.listeners.push((name, callback));
        Ok(())
    }
}

impl Drop for SketchHost {
    fn drop(&mut self) {
        let mut shared = self.shared.borrow_mut();
        for (name, callback) in &self.listeners {
            if let Err(e) = shared.canvas.remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref()) {
                warn_js("sketch: listener removal failed", &e);
            }
        }
        // Closing the queue ends the connection task.
        shared.current = None;
        shared.outbound = None;
    }
}

// =============================================================================
// DOM EVENTS
// =============================================================================

fn on_pointer_down(shared: &mut Shared, ev: &PointerEvent) -> Vec<Action> {
    ev.prevent_default();
    if let Err(e) = shared.canvas.focus() {
        warn_js("sketch: focus failed", &e);
    }
    if let Err(e) = shared.canvas.set_pointer_capture(ev.pointer_id()) {
        warn_js("sketch: pointer capture failed", &e);
    }
    let Some(button) = Button::from_dom(ev.button()) else {
        return Vec::new();
    };
    shared.engine.on_pointer_down(screen_point(ev), button, modifiers(ev))
}

fn on_pointer_up(shared: &mut Shared, ev: &PointerEvent) -> Vec<Action> {
    let Some(button) = Button::from_dom(ev.button()) else {
        return Vec::new();
    };
    shared.engine.on_pointer_up(screen_point(ev), button, modifiers(ev))
}

fn on_wheel(shared: &mut Shared, ev: &WheelEvent) -> Vec<Action> {
    ev.prevent_default();
    let delta = WheelDelta { dx: ev.delta_x(), dy: ev.delta_y() };
    shared.engine.on_wheel(screen_point(ev), delta, modifiers(ev))
}

fn on_key_down(shared: &mut Shared, ev: &KeyboardEvent) -> Vec<Action> {
    // Keep typed keys (space, quote) from scrolling or searching the page.
    if matches!(shared.engine.core.input, InputState::Composing { .. }) {
        ev.prevent_default();
    }
    let modifiers = Modifiers { shift: ev.shift_key(), ctrl: ev.ctrl_key(), alt: ev.alt_key(), meta: ev.meta_key() };
    shared.engine.on_key_down(&Key(ev.key()), modifiers)
}

fn screen_point(ev: &MouseEvent) -> Point {
    Point::new(f64::from(ev.offset_x()), f64::from(ev.offset_y()))
}

fn modifiers(ev: &MouseEvent) -> Modifiers {
    Modifiers { shift: ev.shift_key(), ctrl: ev.ctrl_key(), alt: ev.alt_key(), meta: ev.meta_key() }
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_connection(shared: Rc<RefCell<Shared>>, url: String, history: String, token: String) {
    let socket = match WebSocket::open(&url) {
        Ok(socket) => socket,
        Err(e) => {
            warn(&format!("sketch: socket open failed: {e}"));
            return;
        }
    };
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded::<String>();

    let ticket = {
        let mut shared = shared.borrow_mut();
        let ticket = shared.engine.core.connection_opened();
        match join_text(&shared.engine.core) {
            Ok(text) => {
                if let Err(e) = tx.unbounded_send(text) {
                    warn(&format!("sketch: join not queued: {e}"));
                }
            }
            Err(e) => warn(&format!("sketch: join not built: {e}")),
        }
        shared.outbound = Some(tx);
        shared.current = Some(ticket);
        let actions = shared.engine.core.mark_joined(ticket);
        shared.apply(actions);
        ticket
    };

    wasm_bindgen_futures::spawn_local(replay(Rc::clone(&shared), ticket, history, token));

    let send = async {
        while let Some(text) = rx.next().await {
            if let Err(e) = sink.send(Message::Text(text)).await {
                warn(&format!("sketch: socket send failed: {e}"));
                break;
            }
        }
    };
    let recv = async {
        while let Some(message) = stream.next().await {
            let text = match message {
                Ok(Message::Text(text)) => text,
                Ok(Message::Bytes(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        warn(&format!("sketch: binary frame is not utf-8: {e}"));
                        continue;
                    }
                },
                Err(e) => {
                    warn(&format!("sketch: socket closed: {e}"));
                    break;
                }
            };
            let mut shared = shared.borrow_mut();
            if shared.current != Some(ticket) {
                break;
            }
            match receive_text(&mut shared.engine.core, &text) {
                Ok(actions) => shared.apply(actions),
                Err(e) => warn(&format!("sketch: ignoring server message: {e}")),
            }
        }
    };
    futures::future::select(Box::pin(send), Box::pin(recv)).await;

    let mut shared = shared.borrow_mut();
    if shared.current == Some(ticket) {
        shared.current = None;
        shared.outbound = None;
        shared.engine.core.connection_lost();
        shared.render();
    }
}

async fn replay(shared: Rc<RefCell<Shared>>, ticket: ReplayTicket, path: String, token: String) {
    let result = fetch_history(&path, &token).await;
    let mut shared = shared.borrow_mut();
    match result {
        Ok(history) => {
            let actions = shared.engine.core.complete_replay(ticket, &history.messages);
            shared.apply(actions);
        }
        Err(e) => warn(&format!("sketch: history fetch failed, call connect() to retry: {e}")),
    }
}

async fn fetch_history(path: &str, token: &str) -> Result<HistoryResponse, HostError> {
    let response = Request::get(path)
        .header("Authorization", &format!("Bearer {token}"))
        .send()
        .await
        .map_err(|e| HostError::Transport(e.to_string()))?;
    let status = response.status();
    if !(200..300).contains(&status) {
        return Err(HostError::Status(status));
    }
    response.json::<HistoryResponse>().await.map_err(|e| HostError::Transport(e.to_string()))
}

fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

fn warn_js(context: &str, error: &JsValue) {
    web_sys::console::warn_2(&JsValue::from_str(context), error);
}
