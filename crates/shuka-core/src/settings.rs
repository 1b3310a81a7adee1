//! Application Settings
//!
//! A single value object loaded once at process start and passed to
//! whichever component needs it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// UI / search language
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    /// Wire tag sent to the search backend
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }

    /// Parse a tag, case-insensitively
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Self::En),
            "ru" | "russian" => Some(Self::Ru),
            _ => None,
        }
    }

    /// Pick the search language for a query.
    ///
    /// Any Cyrillic character selects Russian; otherwise the configured
    /// UI language wins.
    pub fn detect(query: &str, fallback: Self) -> Self {
        let cyrillic = query.chars().any(|c| matches!(c, '\u{0400}'..='\u{04FF}'));
        if cyrillic { Self::Ru } else { fallback }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which LLM provider drives the agent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Gemini text completions (pattern protocol)
    #[default]
    Google,
    /// OpenRouter chat completions with native tool calls
    OpenRouter,
}

impl ProviderKind {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Some(Self::Google),
            "openrouter" => Some(Self::OpenRouter),
            _ => None,
        }
    }
}

/// Application settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderKind,

    /// Google API key
    pub api_key: String,

    /// Google model
    pub model: String,

    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub openrouter_base_url: String,

    /// Search endpoint of the scripture backend
    pub backend_url: String,

    /// Base URL of the conversation store (`/api`)
    pub store_url: String,

    pub language: Language,

    /// Serve searches from the built-in demo corpus
    pub use_mock_data: bool,

    /// Maximum agent iterations before forced synthesis
    pub max_steps: usize,

    /// Results requested per search
    pub top_k: usize,

    /// Wall clock per model/search call
    pub call_timeout_secs: u64,

    /// Messages of history replayed to the model
    pub history_window: usize,
}

pub const DEFAULT_MAX_STEPS: usize = 25;
pub const DEFAULT_TOP_K: usize = 20;

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Google,
            api_key: String::new(),
            model: "gemini-2.5-flash-lite".into(),
            openrouter_api_key: String::new(),
            openrouter_model: "google/gemini-2.5-flash".into(),
            openrouter_base_url: "https://openrouter.ai/api/v1".into(),
            backend_url: "http://localhost:5000/api/search".into(),
            store_url: "http://localhost:5000/api".into(),
            language: Language::En,
            use_mock_data: false,
            max_steps: DEFAULT_MAX_STEPS,
            top_k: DEFAULT_TOP_K,
            call_timeout_secs: 120,
            history_window: 50,
        }
    }
}

impl Settings {
    /// Load from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test fixtures)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("SHUKA_PROVIDER").and_then(|v| ProviderKind::parse(&v)) {
            settings.provider = provider;
        }
        if let Some(key) = get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY")) {
            settings.api_key = key;
        }
        if let Some(model) = get("SHUKA_MODEL") {
            settings.model = model;
        }
        if let Some(key) = get("OPENROUTER_API_KEY") {
            settings.openrouter_api_key = key;
        }
        if let Some(model) = get("OPENROUTER_MODEL") {
            settings.openrouter_model = model;
        }
        if let Some(url) = get("OPENROUTER_BASE_URL") {
            settings.openrouter_base_url = url;
        }
        if let Some(url) = get("SHUKA_BACKEND_URL") {
            settings.backend_url = url;
        }
        if let Some(url) = get("SHUKA_STORE_URL") {
            settings.store_url = url;
        }
        if let Some(language) = get("SHUKA_LANGUAGE").and_then(|v| Language::parse(&v)) {
            settings.language = language;
        }
        if let Some(flag) = get("SHUKA_USE_MOCK_DATA") {
            settings.use_mock_data = matches!(flag.trim(), "1" | "true" | "yes");
        }
        if let Some(steps) = get("SHUKA_MAX_STEPS").and_then(|v| v.trim().parse().ok()) {
            settings.max_steps = steps;
        }
        if let Some(top_k) = get("SHUKA_TOP_K").and_then(|v| v.trim().parse().ok()) {
            settings.top_k = top_k;
        }
        if let Some(secs) = get("SHUKA_CALL_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            settings.call_timeout_secs = secs;
        }
        if let Some(window) = get("SHUKA_HISTORY_WINDOW").and_then(|v| v.trim().parse().ok()) {
            settings.history_window = window;
        }

        settings
    }

    /// Load from a JSON file; missing fields take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// API key of the selected provider
    pub fn active_api_key(&self) -> &str {
        match self.provider {
            ProviderKind::Google => &self.api_key,
            ProviderKind::OpenRouter => &self.openrouter_api_key,
        }
    }

    /// Model id of the selected provider
    pub fn active_model(&self) -> &str {
        match self.provider {
            ProviderKind::Google => &self.model,
            ProviderKind::OpenRouter => &self.openrouter_model,
        }
    }

    pub const fn call_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.call_timeout_secs)
    }

    /// Report configuration problems that must stop a turn before it starts
    pub fn validate(&self) -> Result<()> {
        if self.active_api_key().trim().is_empty() {
            return Err(AgentError::Config("API key is missing".into()));
        }
        if !self.use_mock_data && self.backend_url.trim().is_empty() {
            return Err(AgentError::Config("Backend URL is missing".into()));
        }
        if self.max_steps == 0 {
            return Err(AgentError::Config("max_steps must be at least 1".into()));
        }
        Ok(())
    }
}
