//! Conversation Records
//!
//! Persisted chat history and the store that keeps it. A conversation
//! owns its message sequence; messages are immutable once appended except
//! for the in-flight thinking placeholder, which is replaced wholesale.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::source::SourceChunk;
use crate::step::AgentStep;

const TITLE_CHARS: usize = 50;

/// Who wrote a conversation message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

/// Text part in the provider-friendly shape
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One turn in a stored conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub role: Speaker,

    /// Display text
    #[serde(default)]
    pub content: String,

    /// Text sent to the model
    #[serde(default)]
    pub parts: Vec<Part>,

    #[serde(default, with = "chrono::serde::ts_milliseconds_option", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Sources used by a model turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceChunk>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_steps: Vec<AgentStep>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_thinking: bool,
}

impl ConversationMessage {
    fn new(role: Speaker, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            role,
            content: text.clone(),
            parts: vec![Part { text }],
            timestamp: Some(Utc::now()),
            sources: Vec::new(),
            agent_steps: Vec::new(),
            is_thinking: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Speaker::Model, text)
    }

    /// Placeholder shown while a turn is running
    pub fn thinking() -> Self {
        let mut msg = Self::new(Speaker::Model, "");
        msg.is_thinking = true;
        msg
    }

    /// Answer carrying the turn's sources and steps
    pub fn answer(text: impl Into<String>, sources: Vec<SourceChunk>, agent_steps: Vec<AgentStep>) -> Self {
        let mut msg = Self::model(text);
        msg.sources = sources;
        msg.agent_steps = agent_steps;
        msg
    }

    /// Model-facing text: joined parts, or the display content
    pub fn text(&self) -> String {
        if self.parts.is_empty() {
            return self.content.clone();
        }
        self.parts.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("")
    }

    /// Provider message for the history window
    pub fn to_model_message(&self) -> Message {
        match self.role {
            Speaker::User => Message::user(self.text()),
            Speaker::Model => Message::assistant(self.text()),
        }
    }
}

/// List entry without messages
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationHeader {
    pub id: String,
    pub title: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
}

/// A complete conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    /// RFC 3339
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

impl Conversation {
    /// New conversation titled after its first message
    pub fn start(first_message: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: first_message.chars().take(TITLE_CHARS).collect(),
            created_at: Utc::now().to_rfc3339(),
            last_modified: None,
            messages: Vec::new(),
        }
    }

    pub fn header(&self) -> ConversationHeader {
        ConversationHeader {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at.clone(),
            last_modified: self.last_modified,
        }
    }

    pub fn push(&mut self, message: ConversationMessage) {
        self.messages.push(message);
    }

    /// Model history: the last `window` settled messages
    pub fn history(&self, window: usize) -> Vec<Message> {
        let settled: Vec<&ConversationMessage> = self.messages.iter().filter(|m| !m.is_thinking).collect();
        let skip = settled.len().saturating_sub(window);
        settled[skip..].iter().map(|m| m.to_model_message()).collect()
    }

    /// Swap the trailing thinking placeholder for the finished message.
    /// Appends when no placeholder is pending.
    pub fn settle(&mut self, message: ConversationMessage) {
        if self.messages.last().is_some_and(|m| m.is_thinking) {
            self.messages.pop();
        }
        self.messages.push(message);
        self.last_modified = Some(Utc::now().timestamp_millis());
    }

    pub fn is_pending(&self) -> bool {
        self.messages.last().is_some_and(|m| m.is_thinking)
    }
}

/// Conversation persistence.
///
/// Reads and saves degrade on failure (empty list, `None`, `false`) after
/// logging; only `delete` reports failure so callers can refuse to drop
/// the item locally.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn list(&self) -> Vec<ConversationHeader>;

    async fn get(&self, id: &str) -> Option<Conversation>;

    /// Upsert; `true` when persisted
    async fn save(&self, conversation: &Conversation) -> bool;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory conversation store (for development/testing)
#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn list(&self) -> Vec<ConversationHeader> {
        let conversations = self.conversations.read().await;
        let mut headers: Vec<ConversationHeader> = conversations.values().map(Conversation::header).collect();
        // Newest first
        headers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        headers
    }

    async fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations.read().await.get(id).cloned()
    }

    async fn save(&self, conversation: &Conversation) -> bool {
        self.conversations
            .write()
            .await
            .insert(conversation.id.clone(), conversation.clone());
        true
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.conversations
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AgentError::Store(format!("conversation {id} not found")))
    }
}
