//! Client engine for the shared sketch canvas.
//!
//! This crate compiles natively (tests, the `cli` client) and to WebAssembly
//! for the browser (`web::SketchHost`). It turns raw pointer/keyboard input
//! into shapes, keeps the room's shape list in sync with the server, and
//! renders the scene. The host
//! owns the socket and the DOM: it feeds events into the engine, sends the
//! messages the engine builds, and acts on the returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`sync`] | History replay, live apply, reconnection |
//! | [`shape`] | Shape model and the `{shape}` payload codec |
//! | [`tool`] | Shape construction from drags and text drafts |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`viewport`] | Pan/zoom viewport and coordinate conversions |
//! | [`render`] | Scene rendering through the [`render::Painter`] seam |
//! | [`consts`] | Shared constants (colors, zoom limits, stroke widths) |
//! | [`host`] | Action plans and socket text for embeddings |
//! | `web` | `SketchHost`, the wasm-bindgen browser export (wasm32 only) |

pub mod consts;
pub mod engine;
pub mod host;
pub mod input;
pub mod render;
pub mod shape;
pub mod sync;
pub mod tool;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;
