//! OpenRouter LLM Provider
//!
//! OpenAI-compatible `chat/completions` with native tool calling.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shuka_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, Protocol, TokenUsage},
    settings::Settings,
    tool::ToolCall,
};

use crate::http::{build_client, post_json};

/// OpenRouter provider configuration
#[derive(Clone, Debug)]
pub struct OpenRouterConfig {
    pub api_key: String,

    /// e.g. `https://openrouter.ai/api/v1`
    pub base_url: String,

    /// Transport timeout in seconds
    pub timeout_secs: u64,
}

impl OpenRouterConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.openrouter_api_key.clone(),
            base_url: settings.openrouter_base_url.clone(),
            timeout_secs: settings.call_timeout_secs,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunction,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    /// `null` is allowed for assistant messages that only carry tool calls
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    model: Option<String>,
}

/// OpenRouter LLM provider
pub struct OpenRouterProvider {
    client: reqwest::Client,
    config: OpenRouterConfig,
}

impl OpenRouterProvider {
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(config.timeout_secs))?,
            config,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(OpenRouterConfig::from_settings(settings))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn convert_message(m: &Message) -> WireMessage {
        let role = match m.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        let tool_calls: Vec<WireToolCall> = m
            .tool_calls
            .iter()
            .map(|c| WireToolCall {
                id: c.id.clone(),
                kind: function_type(),
                function: WireFunction {
                    name: c.name.clone(),
                    arguments: c.raw_arguments(),
                },
            })
            .collect();
        let content = if m.content.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(m.content.clone())
        };
        WireMessage {
            role,
            content,
            tool_calls,
            tool_call_id: m.tool_call_id.clone(),
        }
    }

    fn build_request(messages: &[Message], options: &GenerationOptions) -> ChatRequest {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = &options.system_prompt {
            wire.push(WireMessage {
                role: "system",
                content: Some(system.clone()),
                tool_calls: Vec::new(),
                tool_call_id: None,
            });
        }
        wire.extend(messages.iter().map(Self::convert_message));

        let tools: Vec<Value> = options.tools.iter().map(|t| t.to_function_declaration()).collect();
        let tool_choice = (!tools.is_empty()).then_some("auto");

        ChatRequest {
            model: options.model.clone(),
            messages: wire,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            tools,
            tool_choice,
        }
    }

    fn convert_response(response: ChatResponse, requested_model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("OpenRouter returned no choices".into()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let id = if c.id.is_empty() { format!("call_{i}") } else { c.id };
                ToolCall::from_raw(id, c.function.name, &c.function.arguments)
            })
            .collect();

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            model: response.model.unwrap_or_else(|| requested_model.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::parse),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "OpenRouter"
    }

    fn protocol(&self) -> Protocol {
        Protocol::ToolCalling
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(AgentError::Config("OpenRouter API key is not set".into()));
        }
        if self.config.base_url.trim().is_empty() {
            return Err(AgentError::Config("OpenRouter base URL is not set".into()));
        }
        Ok(())
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        self.ensure_configured()?;
        let body = Self::build_request(messages, options);
        tracing::debug!(model = %options.model, messages = body.messages.len(), tools = body.tools.len(), "openrouter chat completion");

        let request = self.client.post(self.endpoint()).bearer_auth(&self.config.api_key);
        let response: ChatResponse = post_json(self.name(), request, &body).await?;

        Self::convert_response(response, &options.model)
    }
}
