//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for the LLM backends. Two protocols exist:
//! providers that only complete text (the agent drives them with a
//! `Thought:/Action:/Final Answer:` grammar) and providers with native
//! tool calling.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shuka_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = GeminiProvider::new(config);
//! let completion = provider.complete(&messages, &options).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::{ToolCall, ToolSchema};

/// How the agent talks to a provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Free-text completions parsed for `Thought:/Action:/Final Answer:`
    Pattern,
    /// Native function/tool calling
    ToolCalling,
}

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gemini-2.5-flash-lite")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Stop sequences
    #[serde(default)]
    pub stop_sequences: Vec<String>,

    /// System instruction, for providers that take it separately
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Tools offered to the model; `tool_choice` is automatic when non-empty
    #[serde(default)]
    pub tools: Vec<ToolSchema>,
}

const fn default_temperature() -> f32 {
    0.2
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-lite".into(),
            temperature: default_temperature(),
            max_tokens: None,
            stop_sequences: Vec::new(),
            system_prompt: None,
            tools: Vec::new(),
        }
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text (may be empty alongside tool calls)
    pub content: String,

    /// Tool calls requested by the model
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// Plain text completion
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }

    /// Completion requesting tool calls
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            finish_reason: Some(FinishReason::ToolUse),
            ..Default::default()
        }
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

impl FinishReason {
    /// Map the provider's finish reason strings
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "stop" | "end_turn" | "stop_sequence" => Self::Stop,
            "length" | "max_tokens" => Self::Length,
            "tool_calls" | "function_call" | "tool_use" => Self::ToolUse,
            "content_filter" | "safety" | "recitation" => Self::ContentFilter,
            _ => Self::Error,
        }
    }
}

/// Strategy trait for LLM providers
///
/// The agent works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Which agent protocol this provider speaks
    fn protocol(&self) -> Protocol;

    /// Fail fast on missing credentials, before any loop iteration
    fn ensure_configured(&self) -> Result<()>;

    /// Generate a completion from messages
    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion>;
}

/// Cut `text` at the earliest stop sequence.
///
/// Transports are asked to stop there already; this guards against
/// providers that ignore or only partially honour stop sequences.
pub fn truncate_at_stop<'a>(text: &'a str, stop_sequences: &[String]) -> &'a str {
    stop_sequences
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
        .map_or(text, |idx| &text[..idx])
}
