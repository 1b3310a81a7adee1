//! Gemini LLM Provider
//!
//! Implementation of `LlmProvider` over the `generateContent` REST call.
//! Gemini is driven with the text pattern protocol: the stop sequence on
//! `Observation:` is passed through as `stopSequences`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shuka_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, Protocol, TokenUsage},
    settings::Settings,
};

use crate::http::{build_client, post_json};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,

    /// API root, without the `/models/...` suffix
    pub base_url: String,

    /// Transport timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 120,
        }
    }
}

impl GeminiConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            timeout_secs: settings.call_timeout_secs,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

/// Gemini LLM provider
pub struct GeminiProvider {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(config.timeout_secs))?,
            config,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(GeminiConfig::from_settings(settings))
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.config.base_url.trim_end_matches('/'))
    }

    /// Convert agent messages to Gemini turns.
    ///
    /// System messages join the system instruction; empty turns are
    /// skipped because the API rejects empty parts.
    fn build_request(messages: &[Message], options: &GenerationOptions) -> GenerateRequest {
        let mut system: Vec<String> = options.system_prompt.iter().cloned().collect();
        let mut contents = Vec::new();

        for m in messages {
            if m.content.trim().is_empty() {
                continue;
            }
            let role = match m.role {
                Role::System => {
                    system.push(m.content.clone());
                    continue;
                }
                Role::User | Role::Tool => "user",
                Role::Assistant => "model",
            };
            contents.push(Content {
                role: Some(role.into()),
                parts: vec![Part { text: m.content.clone() }],
            });
        }

        GenerateRequest {
            contents,
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part { text: system.join("\n\n") }],
            }),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                stop_sequences: options.stop_sequences.clone(),
                max_output_tokens: options.max_tokens,
            },
        }
    }

    /// Convert a Gemini response to an agent completion
    fn convert_response(response: GenerateResponse, model: &str) -> Completion {
        let candidate = response.candidates.into_iter().next();
        let finish_reason = candidate
            .as_ref()
            .and_then(|c| c.finish_reason.as_deref())
            .map(FinishReason::parse);
        let content = candidate
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Completion {
            content,
            tool_calls: Vec::new(),
            model: model.to_string(),
            usage: response.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            finish_reason,
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn protocol(&self) -> Protocol {
        Protocol::Pattern
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(AgentError::Config("Google API key is not set".into()));
        }
        Ok(())
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        self.ensure_configured()?;
        let body = Self::build_request(messages, options);
        tracing::debug!(model = %options.model, turns = body.contents.len(), "gemini generateContent");

        let request = self
            .client
            .post(self.endpoint(&options.model))
            .header("x-goog-api-key", &self.config.api_key);
        let response: GenerateResponse = post_json(self.name(), request, &body).await?;

        Ok(Self::convert_response(response, &options.model))
    }
}
