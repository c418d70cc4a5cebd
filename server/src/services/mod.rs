//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own connection bookkeeping, fan-out and the two external
//! contracts (event store, identity verifier) so route handlers can stay
//! focused on protocol translation and auth plumbing.

pub mod broadcast;
pub mod event_store;
pub mod identity;
pub mod registry;
