//! Agent Call Relay API Library Crate
//!
//! This library contains the web service side of the relay: configuration,
//! application state, HTTP handlers, the WebSocket relay session, and routing.
//! The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod ws;
