//! # shuka-core
//!
//! Agentic retrieval loop for scripture study with provider-agnostic LLM
//! abstraction and a pluggable search tool.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         ChatService                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐  │
//! │  │    Agent     │  │  Transcript  │  │    LlmProvider     │  │
//! │  │ (controller) │──│ pattern/tool │──│    (Strategy)      │  │
//! │  └──────┬───────┘  └──────────────┘  └────────────────────┘  │
//! │         │          ┌──────────────┐  ┌────────────────────┐  │
//! │         └──────────│  SearchTool  │  │ ConversationStore  │  │
//! │                    └──────────────┘  └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between a text-pattern provider
//! (Gemini) and a native tool-calling provider (OpenRouter) without
//! changing the loop: each declares its [`provider::Protocol`] and the
//! controller picks the matching transcript.

pub mod chat;
pub mod citation;
pub mod error;
pub mod message;
pub mod parse;
pub mod prompt;
pub mod protocol;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod settings;
pub mod source;
pub mod step;
pub mod tool;

pub use chat::{ChatReply, ChatService, TurnStatus};
pub use error::{AgentError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider, Protocol};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, TurnOutcome, TurnReport};
pub use session::{Conversation, ConversationHeader, ConversationMessage, ConversationStore, MemoryConversationStore};
pub use settings::{Language, ProviderKind, Settings};
pub use source::{Locator, SourceChunk, SourceLedger};
pub use step::{AgentStep, StepKind, TurnEvent, TurnEvents};
pub use tool::{SearchTool, ToolCall, ToolSchema};

pub use tokio_util::sync::CancellationToken;
