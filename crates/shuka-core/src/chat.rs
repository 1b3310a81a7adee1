//! Turn Coordination
//!
//! Runs one user turn against a stored conversation: guards against
//! concurrent turns, keeps the thinking placeholder honest and persists
//! the result whatever the outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{AgentError, Result};
use crate::reasoning::{Agent, TurnOutcome};
use crate::session::{Conversation, ConversationMessage, ConversationStore};
use crate::settings::Language;
use crate::step::TurnEvents;

/// How the turn ended, from the caller's point of view
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnStatus {
    Answered,
    Stopped,
    Failed { error: String },
}

/// Result of [`ChatService::send`]
#[derive(Clone, Debug)]
pub struct ChatReply {
    /// Conversation after the placeholder was settled
    pub conversation: Conversation,
    /// The message that replaced the placeholder
    pub message: ConversationMessage,
    pub status: TurnStatus,
}

fn stopped_message(language: Language) -> &'static str {
    match language {
        Language::En => "Generation stopped by user.",
        Language::Ru => "Генерация остановлена пользователем.",
    }
}

type InFlight = Mutex<HashMap<String, CancellationToken>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the in-flight slot when the turn ends or its future is dropped
struct TurnSlot<'a> {
    in_flight: &'a InFlight,
    id: String,
}

impl Drop for TurnSlot<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.id);
    }
}

/// Per-conversation turn lifecycle
pub struct ChatService {
    agent: Arc<Agent>,
    store: Arc<dyn ConversationStore>,
    history_window: usize,
    in_flight: InFlight,
}

impl ChatService {
    pub fn new(agent: Arc<Agent>, store: Arc<dyn ConversationStore>, history_window: usize) -> Self {
        Self {
            agent,
            store,
            history_window,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn language(&self) -> Language {
        self.agent.config().language
    }

    /// Run one turn.
    ///
    /// Configuration errors, an empty message and a turn already in flight
    /// are returned as errors before the conversation is touched. Every
    /// other outcome settles the placeholder and is reported in
    /// [`ChatReply::status`]. `cancel` is registered under the conversation
    /// id so [`ChatService::cancel`] reaches it too.
    pub async fn send(
        &self,
        conversation_id: Option<&str>,
        text: &str,
        events: TurnEvents,
        cancel: CancellationToken,
    ) -> Result<ChatReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AgentError::InvalidRequest("message is empty".into()));
        }
        self.agent.preflight()?;

        // The slot is taken before the stored record is read
        let (_slot, mut conversation) = match conversation_id {
            Some(id) => {
                let slot = self.register(id, &cancel)?;
                let conversation = self
                    .store
                    .get(id)
                    .await
                    .ok_or_else(|| AgentError::InvalidRequest(format!("conversation {id} not found")))?;
                (slot, conversation)
            }
            None => {
                let conversation = Conversation::start(text);
                (self.register(&conversation.id, &cancel)?, conversation)
            }
        };

        Ok(self.run(&mut conversation, text, events, &cancel).await)
    }

    async fn run(
        &self,
        conversation: &mut Conversation,
        text: &str,
        events: TurnEvents,
        cancel: &CancellationToken,
    ) -> ChatReply {
        let history = conversation.history(self.history_window);
        conversation.push(ConversationMessage::user(text));
        conversation.push(ConversationMessage::thinking());

        let language = self.language();
        let (message, status) = match self.agent.run_turn(text, &history, events, cancel).await {
            Ok(report) => match report.outcome {
                TurnOutcome::Answered(answer) => (
                    ConversationMessage::answer(answer, report.sources, report.steps),
                    TurnStatus::Answered,
                ),
                TurnOutcome::Aborted => {
                    tracing::info!(conversation = %conversation.id, "turn stopped by user");
                    (ConversationMessage::model(stopped_message(language)), TurnStatus::Stopped)
                }
            },
            Err(e) => {
                tracing::error!(conversation = %conversation.id, error = %e, "turn failed");
                (
                    ConversationMessage::model(e.user_message(language)),
                    TurnStatus::Failed { error: e.to_string() },
                )
            }
        };

        conversation.settle(message.clone());
        if !self.store.save(conversation).await {
            tracing::warn!(conversation = %conversation.id, "conversation was not persisted");
        }

        ChatReply {
            conversation: conversation.clone(),
            message,
            status,
        }
    }

    fn register(&self, id: &str, cancel: &CancellationToken) -> Result<TurnSlot<'_>> {
        let mut in_flight = lock(&self.in_flight);
        if in_flight.contains_key(id) {
            return Err(AgentError::Busy(id.to_string()));
        }
        in_flight.insert(id.to_string(), cancel.clone());
        Ok(TurnSlot {
            in_flight: &self.in_flight,
            id: id.to_string(),
        })
    }

    /// Stop the in-flight turn; `false` when none is running
    pub fn cancel(&self, conversation_id: &str) -> bool {
        match lock(&self.in_flight).get(conversation_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_busy(&self, conversation_id: &str) -> bool {
        lock(&self.in_flight).contains_key(conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::provider::{Completion, GenerationOptions, LlmProvider, Protocol};
    use crate::reasoning::AgentBuilder;
    use crate::session::MemoryConversationStore;
    use crate::source::SourceChunk;
    use crate::tool::SearchTool;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Echoes how much history it saw; optionally slow or failing
    struct EchoProvider {
        seen: std::sync::Mutex<Vec<Vec<Message>>>,
        delay: Option<Duration>,
        fail: bool,
        configured: bool,
    }

    impl EchoProvider {
        fn new() -> Self {
            Self {
                seen: std::sync::Mutex::new(Vec::new()),
                delay: None,
                fail: false,
                configured: true,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn protocol(&self) -> Protocol {
            Protocol::ToolCalling
        }

        fn ensure_configured(&self) -> Result<()> {
            if self.configured {
                Ok(())
            } else {
                Err(AgentError::Config("OpenRouter API key is not set".into()))
            }
        }

        async fn complete(&self, messages: &[Message], _options: &GenerationOptions) -> Result<Completion> {
            self.seen.lock().unwrap().push(messages.to_vec());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(AgentError::RateLimited("429".into()));
            }
            Ok(Completion::text(format!("answer after {} messages", messages.len())))
        }
    }

    struct NoSearch;

    #[async_trait]
    impl SearchTool for NoSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SourceChunk>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    fn service(provider: EchoProvider) -> (Arc<ChatService>, Arc<MemoryConversationStore>) {
        let agent = AgentBuilder::new()
            .provider(Arc::new(provider))
            .search(Arc::new(NoSearch))
            .build()
            .unwrap();
        let store = Arc::new(MemoryConversationStore::new());
        (Arc::new(ChatService::new(Arc::new(agent), store.clone(), 50)), store)
    }

    #[tokio::test]
    async fn test_turn_creates_and_persists_conversation() {
        let (chat, store) = service(EchoProvider::new());
        let reply = chat.send(None, "What is dharma?", TurnEvents::none(), CancellationToken::new()).await.unwrap();

        assert_eq!(reply.status, TurnStatus::Answered);
        assert_eq!(reply.conversation.title, "What is dharma?");
        assert_eq!(reply.conversation.messages.len(), 2);
        assert!(!reply.conversation.is_pending());
        assert!(store.get(&reply.conversation.id).await.is_some());
    }

    #[tokio::test]
    async fn test_history_excludes_current_message() {
        let (chat, _store) = service(EchoProvider::new());
        let first = chat.send(None, "first", TurnEvents::none(), CancellationToken::new()).await.unwrap();
        let second = chat
            .send(Some(&first.conversation.id), "second", TurnEvents::none(), CancellationToken::new())
            .await
            .unwrap();

        // system + (user, model) from turn one + the new query
        assert_eq!(second.message.text(), "answer after 4 messages");
        assert_eq!(second.conversation.messages.len(), 4);
        assert_eq!(second.conversation.messages[2].role, crate::session::Speaker::User);
    }

    #[tokio::test]
    async fn test_model_failure_settles_with_localized_error() {
        let mut provider = EchoProvider::new();
        provider.fail = true;
        let (chat, store) = service(provider);
        let reply = chat.send(None, "Кто такой Нарада?", TurnEvents::none(), CancellationToken::new()).await.unwrap();

        assert!(matches!(reply.status, TurnStatus::Failed { .. }));
        assert_eq!(reply.message.text(), AgentError::RateLimited(String::new()).user_message(Language::En));
        let stored = store.get(&reply.conversation.id).await.unwrap();
        assert!(!stored.is_pending());
    }

    #[tokio::test]
    async fn test_config_error_before_touching_store() {
        let mut provider = EchoProvider::new();
        provider.configured = false;
        let (chat, store) = service(provider);
        let err = chat.send(None, "hello", TurnEvents::none(), CancellationToken::new()).await.unwrap_err();

        assert!(err.is_config());
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_turn_is_busy_and_cancel_stops() {
        let mut provider = EchoProvider::new();
        provider.delay = Some(Duration::from_secs(30));
        let (chat, store) = service(provider);

        let conversation = Conversation::start("slow");
        let id = conversation.id.clone();
        store.save(&conversation).await;

        let runner = chat.clone();
        let turn_id = id.clone();
        let turn = tokio::spawn(async move { runner.send(Some(&turn_id), "slow", TurnEvents::none(), CancellationToken::new()).await });

        while !chat.is_busy(&id) {
            tokio::task::yield_now().await;
        }
        let err = chat.send(Some(&id), "again", TurnEvents::none(), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::Busy(_)));

        assert!(chat.cancel(&id));
        let reply = turn.await.unwrap().unwrap();
        assert_eq!(reply.status, TurnStatus::Stopped);
        assert_eq!(reply.message.text(), stopped_message(Language::En));
        assert_eq!(reply.message.role, crate::session::Speaker::Model);
        assert!(!chat.is_busy(&id));
        assert!(!chat.cancel(&id));
    }

    /// Memory store whose reads after the first are slow
    struct SlowReadStore {
        inner: MemoryConversationStore,
        reads: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl ConversationStore for SlowReadStore {
        async fn list(&self) -> Vec<crate::session::ConversationHeader> {
            self.inner.list().await
        }

        async fn get(&self, id: &str) -> Option<Conversation> {
            if self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            self.inner.get(id).await
        }

        async fn save(&self, conversation: &Conversation) -> bool {
            self.inner.save(conversation).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_second_turn_cannot_read_stale_record() {
        let mut provider = EchoProvider::new();
        provider.delay = Some(Duration::from_millis(50));
        let agent = AgentBuilder::new()
            .provider(Arc::new(provider))
            .search(Arc::new(NoSearch))
            .build()
            .unwrap();
        let store = Arc::new(SlowReadStore {
            inner: MemoryConversationStore::new(),
            reads: std::sync::atomic::AtomicUsize::new(0),
        });
        let chat = Arc::new(ChatService::new(Arc::new(agent), store.clone(), 50));

        let conversation = Conversation::start("shared");
        let id = conversation.id.clone();
        store.save(&conversation).await;

        let runner = chat.clone();
        let turn_id = id.clone();
        let first =
            tokio::spawn(async move { runner.send(Some(&turn_id), "first", TurnEvents::none(), CancellationToken::new()).await });
        while !chat.is_busy(&id) {
            tokio::task::yield_now().await;
        }

        let err = chat.send(Some(&id), "second", TurnEvents::none(), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::Busy(_)));

        first.await.unwrap().unwrap();
        let stored = store.get(&id).await.unwrap();
        let texts: Vec<String> = stored.messages.iter().map(ConversationMessage::text).collect();
        assert_eq!(texts, vec!["first".to_string(), "answer after 2 messages".to_string()]);
    }

    #[tokio::test]
    async fn test_dropped_turn_releases_conversation() {
        let mut provider = EchoProvider::new();
        provider.delay = Some(Duration::from_secs(30));
        let (chat, store) = service(provider);

        let conversation = Conversation::start("abandoned");
        let id = conversation.id.clone();
        store.save(&conversation).await;

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            chat.send(Some(&id), "hello", TurnEvents::none(), CancellationToken::new()),
        )
        .await;
        assert!(abandoned.is_err());

        assert!(!chat.is_busy(&id));
        assert!(!chat.cancel(&id));
    }

    #[tokio::test]
    async fn test_unknown_conversation_releases_slot() {
        let (chat, _store) = service(EchoProvider::new());
        let err = chat.send(Some("missing"), "hello", TurnEvents::none(), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidRequest(_)));
        assert!(!chat.is_busy("missing"));
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (chat, _store) = service(EchoProvider::new());
        let err = chat.send(None, "   ", TurnEvents::none(), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidRequest(_)));
    }
}
