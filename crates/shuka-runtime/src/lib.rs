//! # shuka-runtime
//!
//! LLM providers for the shuka agent.
//!
//! ## Providers
//!
//! - **Gemini** (default): `generateContent`, driven with the text pattern protocol
//! - **OpenRouter**: OpenAI-compatible `chat/completions` with native tool calling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shuka_runtime::build_provider;
//!
//! let provider = build_provider(&settings)?;
//! let agent = AgentBuilder::new()
//!     .settings(&settings)
//!     .provider(provider)
//!     .search(search)
//!     .build()?;
//! ```

pub mod gemini;
mod http;
pub mod openrouter;

use std::sync::Arc;

pub use gemini::GeminiProvider;
pub use openrouter::OpenRouterProvider;

use shuka_core::{LlmProvider, ProviderKind, Result, Settings};

/// Provider selected by `settings.provider`
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match settings.provider {
        ProviderKind::Google => Arc::new(GeminiProvider::from_settings(settings)?),
        ProviderKind::OpenRouter => Arc::new(OpenRouterProvider::from_settings(settings)?),
    };
    tracing::info!(provider = provider.name(), model = settings.active_model(), "LLM provider ready");
    Ok(provider)
}

// Re-export core types for convenience
pub use shuka_core::{AgentError, Completion, GenerationOptions, Message, Protocol, Role};
