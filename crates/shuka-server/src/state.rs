//! Application State

use std::sync::Arc;

use shuka_core::{ChatService, Settings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Turn coordination over the agent and the conversation store
    pub chat: Arc<ChatService>,

    /// Settings loaded at startup
    pub settings: Arc<Settings>,
}
