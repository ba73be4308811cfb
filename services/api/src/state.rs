//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the immutable
//! configuration and the service clients shared by every handler.

use crate::config::Config;
use relay_core::telephony::{CallInitiator, HttpCallInitiator};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when no telephony provider is configured.
    pub call_initiator: Option<Arc<dyn CallInitiator>>,
}

impl AppState {
    /// Builds the state from configuration, wiring the HTTP call initiator
    /// when telephony credentials are present.
    pub fn new(config: Config) -> Self {
        let call_initiator = config
            .telephony
            .clone()
            .map(|telephony| Arc::new(HttpCallInitiator::new(telephony)) as Arc<dyn CallInitiator>);
        Self {
            config: Arc::new(config),
            call_initiator,
        }
    }
}
