//! Tool System
//!
//! The agent has exactly one capability, `search_database(query)`. Its
//! schema is declared here so both protocols describe it identically, and
//! the `SearchTool` trait is the seam the search adapter plugs into.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::source::SourceChunk;

/// Name of the single search tool
pub const SEARCH_TOOL_NAME: &str = "search_database";

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Decoded arguments; an undecodable payload is kept as a JSON string
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Build from a raw JSON argument string as sent by chat-completion APIs
    pub fn from_raw(id: impl Into<String>, name: impl Into<String>, raw_arguments: &str) -> Self {
        let arguments = serde_json::from_str(raw_arguments)
            .unwrap_or_else(|_| serde_json::Value::String(raw_arguments.to_string()));
        Self::new(id, name, arguments)
    }

    /// String argument by key
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(serde_json::Value::as_str)
    }

    /// Arguments re-encoded as the JSON string chat-completion APIs expect
    pub fn raw_arguments(&self) -> String {
        match &self.arguments {
            serde_json::Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// The `search_database(query)` declaration
    pub fn search_database() -> Self {
        Self {
            name: SEARCH_TOOL_NAME.into(),
            description: "Search the scripture database (books of Srila Prabhupada: Bhagavad-gita, \
                Srimad-Bhagavatam, Caitanya-caritamrta and others). Returns the most relevant verses \
                with their ids."
                .into(),
            parameters: vec![ParameterSchema {
                name: "query".into(),
                param_type: "string".into(),
                description: "Search query. Reduce names and key terms to nominative / dictionary \
                    form (\"Kamsa\", not \"of Kamsa\"). Prefer the language of the database first. \
                    Use a single word for proper names and a short phrase for concepts."
                    .into(),
                required: true,
            }],
        }
    }

    /// JSON Schema object for the parameters
    pub fn parameters_json_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({ "type": p.param_type, "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// OpenAI-style `{"type":"function","function":{...}}` declaration
    pub fn to_function_declaration(&self) -> serde_json::Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_json_schema(),
            }
        })
    }
}

/// Scripture search capability used by the agent loop.
///
/// `Ok(vec![])` is the answer for "nothing found" and for backend-reported
/// failures; `Err` is reserved for transport failures. Neither ends a turn.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Fail fast on missing configuration, before any loop iteration
    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    /// Run one search
    async fn search(&self, query: &str) -> Result<Vec<SourceChunk>>;

    /// Backend name for logs
    fn name(&self) -> &str;
}
