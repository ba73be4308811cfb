//! WebSocket Relay
//!
//! Everything that happens on `/ws`:
//!
//! - `session`: pairs the client socket with an agent socket and pumps frames
//!   both ways until either side goes away.
//! - `upstream`: opens and writes to the agent connection.

pub mod session;
mod upstream;

pub use session::{RelaySession, SessionEnd, SessionError, ws_handler};
