//! # shuka-backend
//!
//! Collaborators of the agent loop that live behind HTTP: the scripture
//! search service and the conversation store.
//!
//! ```text
//! ┌──────────────┐   POST {query, language, top_k}   ┌───────────────────┐
//! │    Agent     │ ────────────────────────────────▶ │  search backend   │
//! │  SearchTool  │ ◀──────────────────────────────── │ {success,results} │
//! └──────────────┘                                   └───────────────────┘
//!
//! ┌──────────────┐   GET/POST/DELETE /conversations  ┌───────────────────┐
//! │ ChatService  │ ◀───────────────────────────────▶ │ conversation API  │
//! └──────────────┘                                   └───────────────────┘
//! ```
//!
//! With `use_mock_data` the search is served from a built-in demo corpus.

pub mod error;
pub mod mock;
pub mod search;
pub mod store;

use std::sync::Arc;

pub use error::{BackendError, Result};
pub use mock::MockScriptureSearch;
pub use search::{HttpScriptureSearch, SearchConfig};
pub use store::HttpConversationStore;

use shuka_core::{Settings, tool::SearchTool};

/// Search tool selected by `settings.use_mock_data`
pub fn build_search(settings: &Settings) -> Result<Arc<dyn SearchTool>> {
    if settings.use_mock_data {
        tracing::info!("using the offline demo corpus for search");
        return Ok(Arc::new(MockScriptureSearch::new()));
    }
    tracing::info!(url = %settings.backend_url, top_k = settings.top_k, "using the HTTP search backend");
    Ok(Arc::new(HttpScriptureSearch::from_settings(settings)?))
}
