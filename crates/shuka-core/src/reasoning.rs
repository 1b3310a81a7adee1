//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) control flow shared by both
//! provider protocols: call the model, run the searches it asks for,
//! accumulate sources, and stop on a final answer, a spent step budget
//! (followed by one forced synthesis call) or cancellation.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::citation::{normalize_markers, unresolved_citations};
use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::protocol::{
    Directive, ModelRequest, PatternTranscript, SearchOutcome, ToolTranscript, Transcript, TurnContext,
};
use crate::provider::{Completion, GenerationOptions, LlmProvider, Protocol};
use crate::settings::{DEFAULT_MAX_STEPS, Language, Settings};
use crate::source::{SourceChunk, SourceLedger};
use crate::step::{AgentStep, StepKind, StepLog, TurnEvent, TurnEvents};
use crate::tool::SearchTool;

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Maximum reasoning iterations before forced synthesis
    pub max_steps: usize,

    /// Wall clock per model or search call
    pub call_timeout: Duration,

    /// Preferred answer/search language
    pub language: Language,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            call_timeout: Duration::from_secs(120),
            language: Language::En,
            generation: GenerationOptions::default(),
        }
    }
}

impl AgentConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_steps: settings.max_steps,
            call_timeout: settings.call_timeout(),
            language: settings.language,
            generation: GenerationOptions {
                model: settings.active_model().to_string(),
                ..Default::default()
            },
        }
    }
}

/// How a turn ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "answer", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Final answer with `[[id]]` citation markers
    Answered(String),
    /// Stopped by the caller's cancellation token
    Aborted,
}

impl TurnOutcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered(answer) => Some(answer),
            Self::Aborted => None,
        }
    }

    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Everything a turn produced
#[derive(Clone, Debug)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    pub steps: Vec<AgentStep>,
    /// Unique by id
    pub sources: Vec<SourceChunk>,
    pub model_calls: usize,
    pub searches: usize,
}

/// Live state of one loop invocation
struct TurnState {
    log: StepLog,
    ledger: SourceLedger,
    model_calls: usize,
    searches: usize,
}

impl TurnState {
    fn new(events: TurnEvents) -> Self {
        Self {
            log: StepLog::new(events),
            ledger: SourceLedger::new(),
            model_calls: 0,
            searches: 0,
        }
    }

    /// Accumulate a search outcome and report it
    fn observe(&mut self, outcome: &SearchOutcome) {
        self.searches += 1;
        let summary = match outcome {
            SearchOutcome::Found(chunks) => {
                for source in self.ledger.absorb(chunks) {
                    self.log.events().emit(TurnEvent::Source { source });
                }
                format!("Found {} results.", chunks.len())
            }
            SearchOutcome::Failed(_) => "Search failed; treating as 0 results.".to_string(),
        };
        self.log.push(StepKind::Observation, summary);
    }

    fn finish(self, outcome: TurnOutcome) -> TurnReport {
        TurnReport {
            outcome,
            steps: self.log.into_steps(),
            sources: self.ledger.into_sources(),
            model_calls: self.model_calls,
            searches: self.searches,
        }
    }
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchTool>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(provider: Arc<dyn LlmProvider>, search: Arc<dyn SearchTool>, config: AgentConfig) -> Self {
        Self {
            provider,
            search,
            config,
        }
    }

    /// Configuration errors that must fail before any loop iteration
    pub fn preflight(&self) -> Result<()> {
        if self.config.max_steps == 0 {
            return Err(AgentError::Config("max_steps must be at least 1".into()));
        }
        self.provider.ensure_configured()?;
        self.search.ensure_configured()
    }

    /// Run one user turn.
    ///
    /// `history` holds the earlier turns of the conversation, not the
    /// query itself. Cancellation resolves to [`TurnOutcome::Aborted`];
    /// only configuration and model-call failures are errors.
    pub async fn run_turn(
        &self,
        query: &str,
        history: &[Message],
        events: TurnEvents,
        cancel: &CancellationToken,
    ) -> Result<TurnReport> {
        self.preflight()?;

        let ctx = TurnContext {
            query,
            history,
            language: self.config.language,
            generation: &self.config.generation,
        };
        let transcript: Box<dyn Transcript> = match self.provider.protocol() {
            Protocol::Pattern => Box::new(PatternTranscript::new(&ctx)),
            Protocol::ToolCalling => Box::new(ToolTranscript::new(&ctx)),
        };

        tracing::info!(
            provider = self.provider.name(),
            search = self.search.name(),
            max_steps = self.config.max_steps,
            "starting agent turn"
        );

        let mut turn = TurnState::new(events);
        let outcome = self.drive(transcript, &mut turn, cancel).await?;

        tracing::info!(
            aborted = outcome.is_aborted(),
            model_calls = turn.model_calls,
            searches = turn.searches,
            sources = turn.ledger.len(),
            "agent turn finished"
        );
        Ok(turn.finish(outcome))
    }

    async fn drive(
        &self,
        mut transcript: Box<dyn Transcript>,
        turn: &mut TurnState,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        for step in 1..=self.config.max_steps {
            if cancel.is_cancelled() {
                return Ok(TurnOutcome::Aborted);
            }
            tracing::debug!(step, "agent iteration");

            let request = transcript.next_request();
            let Some(completion) = self.call_model(&request, cancel).await? else {
                return Ok(TurnOutcome::Aborted);
            };
            turn.model_calls += 1;

            match transcript.absorb(completion, &mut turn.log) {
                Directive::Final(answer) => return Ok(TurnOutcome::Answered(self.finalize(&answer, turn))),
                Directive::Search(requests) => {
                    for request in requests {
                        if cancel.is_cancelled() {
                            return Ok(TurnOutcome::Aborted);
                        }
                        turn.log
                            .push(StepKind::Action, format!("Searching for: \"{}\"", request.query));
                        let Some(outcome) = self.run_search(&request.query, cancel).await else {
                            return Ok(TurnOutcome::Aborted);
                        };
                        turn.observe(&outcome);
                        transcript.record_observation(&request, &outcome);
                    }
                }
                Directive::Continue => {}
                Directive::Stalled => {
                    tracing::warn!(step, "empty model response; moving to synthesis");
                    break;
                }
            }
        }

        if cancel.is_cancelled() {
            return Ok(TurnOutcome::Aborted);
        }
        tracing::warn!(max_steps = self.config.max_steps, "no final answer within the step budget");
        turn.log.push(
            StepKind::Thought,
            "Reaching the step limit. Synthesizing the information gathered so far...",
        );

        let request = transcript.synthesis_request();
        let answer = match self.call_model(&request, cancel).await {
            Ok(Some(completion)) => {
                turn.model_calls += 1;
                transcript.finish_synthesis(completion)
            }
            Ok(None) => return Ok(TurnOutcome::Aborted),
            Err(e) => {
                tracing::warn!(error = %e, "forced synthesis failed");
                transcript.synthesis_fallback()
            }
        };
        Ok(TurnOutcome::Answered(self.finalize(&answer, turn)))
    }

    /// One model call bounded by the timeout and the cancellation token.
    /// `None` means cancelled.
    async fn call_model(&self, request: &ModelRequest, cancel: &CancellationToken) -> Result<Option<Completion>> {
        let call = tokio::time::timeout(
            self.config.call_timeout,
            self.provider.complete(&request.messages, &request.options),
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => Ok(None),
            result = call => match result {
                Ok(completion) => completion.map(Some),
                Err(_) => Err(AgentError::Timeout(self.config.call_timeout.as_secs())),
            },
        }
    }

    /// One search; failures become [`SearchOutcome::Failed`]. `None` means cancelled.
    async fn run_search(&self, query: &str, cancel: &CancellationToken) -> Option<SearchOutcome> {
        let call = tokio::time::timeout(self.config.call_timeout, self.search.search(query));
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = call => Some(match result {
                Ok(Ok(chunks)) => SearchOutcome::Found(chunks),
                Ok(Err(e)) => {
                    tracing::warn!(query, error = %e, "search failed");
                    SearchOutcome::Failed(e.to_string())
                }
                Err(_) => {
                    tracing::warn!(query, "search timed out");
                    SearchOutcome::Failed(format!("timed out after {} seconds", self.config.call_timeout.as_secs()))
                }
            }),
        }
    }

    /// Canonicalize citation markers and flag unknown ids
    fn finalize(&self, answer: &str, turn: &TurnState) -> String {
        let answer = normalize_markers(answer);
        let unresolved = unresolved_citations(&answer, turn.ledger.sources());
        if !unresolved.is_empty() {
            tracing::warn!(?unresolved, "answer cites ids not retrieved this turn");
        }
        answer
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    search: Option<Arc<dyn SearchTool>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            search: None,
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn search(mut self, search: Arc<dyn SearchTool>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn settings(mut self, settings: &Settings) -> Self {
        self.config = AgentConfig::from_settings(settings);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub const fn max_steps(mut self, max: usize) -> Self {
        self.config.max_steps = max;
        self
    }

    pub const fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub const fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let search = self
            .search
            .ok_or_else(|| AgentError::Config("Search tool is required".into()))?;

        Ok(Agent::new(provider, search, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::FORCED_SYNTHESIS_PROMPT;
    use crate::tool::{SEARCH_TOOL_NAME, ToolCall};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted completions and records every request
    struct ScriptedProvider {
        protocol: Protocol,
        script: Mutex<VecDeque<Result<Completion>>>,
        requests: Mutex<Vec<Vec<Message>>>,
        configured: bool,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new(protocol: Protocol, script: Vec<Result<Completion>>) -> Self {
            Self {
                protocol,
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
                configured: true,
                delay: None,
            }
        }

        fn texts(protocol: Protocol, texts: &[&str]) -> Self {
            Self::new(protocol, texts.iter().map(|t| Ok(Completion::text(*t))).collect())
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> Vec<Message> {
            self.requests.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn protocol(&self) -> Protocol {
            self.protocol
        }

        fn ensure_configured(&self) -> Result<()> {
            if self.configured {
                Ok(())
            } else {
                Err(AgentError::Config("API key is not set".into()))
            }
        }

        async fn complete(&self, messages: &[Message], _options: &GenerationOptions) -> Result<Completion> {
            self.requests.lock().unwrap().push(messages.to_vec());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::Provider("script exhausted".into())))
        }
    }

    /// Returns scripted batches; `Err` entries simulate transport failures
    struct ScriptedSearch {
        batches: Mutex<VecDeque<Result<Vec<SourceChunk>>>>,
        queries: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedSearch {
        fn new(batches: Vec<Result<Vec<SourceChunk>>>) -> Self {
            Self {
                batches: Mutex::new(batches.into()),
                queries: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchTool for ScriptedSearch {
        async fn search(&self, query: &str) -> Result<Vec<SourceChunk>> {
            self.queries.lock().unwrap().push(query.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.batches.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn chunk(id: &str, content: &str) -> SourceChunk {
        let mut chunk = SourceChunk::new("Srimad Bhagavatam", Some(1_i64.into()), Some(1_i64.into()), content, 0.8);
        chunk.id = id.to_string();
        chunk
    }

    fn search_call(id: &str, query: &str) -> Result<Completion> {
        Ok(Completion::with_tool_calls(
            "",
            vec![ToolCall::new(id, SEARCH_TOOL_NAME, json!({ "query": query }))],
        ))
    }

    fn agent(provider: &Arc<ScriptedProvider>, search: &Arc<ScriptedSearch>, max_steps: usize) -> Agent {
        AgentBuilder::new()
            .provider(provider.clone())
            .search(search.clone())
            .max_steps(max_steps)
            .call_timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    async fn run(agent: &Agent, query: &str) -> TurnReport {
        agent
            .run_turn(query, &[], TurnEvents::none(), &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_direct_answer_without_search() {
        let provider = Arc::new(ScriptedProvider::texts(
            Protocol::Pattern,
            &["Thought: I can answer this.\nFinal Answer: Hare Krishna."],
        ));
        let search = Arc::new(ScriptedSearch::new(Vec::new()));
        let report = run(&agent(&provider, &search, 5), "Hello").await;

        assert_eq!(report.outcome.answer(), Some("Hare Krishna."));
        assert_eq!(report.model_calls, 1);
        assert_eq!(report.searches, 0);
        assert!(report.steps.iter().all(|s| s.kind != StepKind::Action));
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn test_tool_protocol_content_is_final() {
        let provider = Arc::new(ScriptedProvider::texts(Protocol::ToolCalling, &["  Radhe Radhe. "]));
        let search = Arc::new(ScriptedSearch::new(Vec::new()));
        let report = run(&agent(&provider, &search, 5), "Hello").await;

        assert_eq!(report.outcome.answer(), Some("Radhe Radhe."));
        assert_eq!(report.model_calls, 1);
        assert!(report.steps.is_empty());
    }

    #[tokio::test]
    async fn test_pattern_search_then_answer() {
        let provider = Arc::new(ScriptedProvider::texts(
            Protocol::Pattern,
            &[
                "Thought: I should look up the soul.\nAction: search_database(\"soul\")",
                "Thought: Found it.\nFinal Answer: The soul is eternal [[ID:bg.2.20]].",
            ],
        ));
        let search = Arc::new(ScriptedSearch::new(vec![Ok(vec![chunk("bg.2.20", "For the soul there is neither birth nor death")])]));
        let report = run(&agent(&provider, &search, 5), "What is the soul?").await;

        assert_eq!(report.outcome.answer(), Some("The soul is eternal [[bg.2.20]]."));
        assert_eq!(report.model_calls, 2);
        assert_eq!(search.queries(), vec!["soul".to_string()]);
        let count = |kind| report.steps.iter().filter(|s| s.kind == kind).count();
        assert_eq!(count(StepKind::Action), 1);
        assert_eq!(count(StepKind::Observation), 1);
        assert_eq!(report.sources.len(), 1);

        // the second call sees the real observation in the replayed scratchpad
        let replay = provider.last_request();
        assert!(replay.last().unwrap().content.contains("[ID:bg.2.20]"));
    }

    #[tokio::test]
    async fn test_sources_deduplicated_across_searches() {
        let provider = Arc::new(ScriptedProvider::new(
            Protocol::ToolCalling,
            vec![
                search_call("call_1", "creation"),
                search_call("call_2", "Vyasa"),
                Ok(Completion::text("Vyasadeva meditated [[sb.1.1.1]] [[sb.1.1.2]].")),
            ],
        ));
        let search = Arc::new(ScriptedSearch::new(vec![
            Ok(vec![chunk("sb.1.1.1", "first"), chunk("sb.1.1.2", "second")]),
            Ok(vec![chunk("sb.1.1.1", "first again")]),
        ]));
        let agent = agent(&provider, &search, 5);
        let (events, mut rx) = TurnEvents::channel();
        let report = agent
            .run_turn("Who compiled the Bhagavatam?", &[], events, &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<&str> = report.sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["sb.1.1.1", "sb.1.1.2"]);
        assert_eq!(report.searches, 2);
        assert_eq!(report.model_calls, 3);

        let mut source_events = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, TurnEvent::Source { .. }) {
                source_events += 1;
            }
        }
        assert_eq!(source_events, 2);

        // tool results are attached to their call ids
        let messages = provider.last_request();
        assert!(
            messages
                .iter()
                .any(|m| m.role == crate::message::Role::Tool && m.tool_call_id.as_deref() == Some("call_2"))
        );
    }

    #[tokio::test]
    async fn test_step_budget_forces_synthesis() {
        let provider = Arc::new(ScriptedProvider::texts(
            Protocol::Pattern,
            &[
                "Thought: thinking",
                "Thought: still thinking",
                "Thought: thinking more",
                "Synthesized from what I found.",
            ],
        ));
        let search = Arc::new(ScriptedSearch::new(Vec::new()));
        let report = run(&agent(&provider, &search, 3), "Explain karma").await;

        assert_eq!(provider.calls(), 4);
        assert_eq!(report.outcome.answer(), Some("Synthesized from what I found."));
        let last = provider.last_request();
        assert_eq!(last.last().unwrap().content, FORCED_SYNTHESIS_PROMPT);
    }

    #[tokio::test]
    async fn test_tool_synthesis_failure_uses_last_content() {
        let provider = Arc::new(ScriptedProvider::new(
            Protocol::ToolCalling,
            vec![
                Ok(Completion::with_tool_calls(
                    "Partial findings so far",
                    vec![ToolCall::new("call_1", SEARCH_TOOL_NAME, json!({ "query": "dharma" }))],
                )),
                Err(AgentError::ProviderUnavailable("503".into())),
            ],
        ));
        let search = Arc::new(ScriptedSearch::new(Vec::new()));
        let report = run(&agent(&provider, &search, 1), "What is dharma?").await;

        assert_eq!(report.outcome.answer(), Some("Partial findings so far"));
        assert_eq!(report.model_calls, 1);
    }

    #[tokio::test]
    async fn test_search_failure_is_an_observation() {
        let provider = Arc::new(ScriptedProvider::texts(
            Protocol::Pattern,
            &[
                "Thought: search\nAction: search_database(\"Kamsa\")",
                "Final Answer: The database did not answer.",
            ],
        ));
        let search = Arc::new(ScriptedSearch::new(vec![Err(AgentError::Search("connection refused".into()))]));
        let report = run(&agent(&provider, &search, 5), "Who is Kamsa?").await;

        assert_eq!(report.outcome.answer(), Some("The database did not answer."));
        assert!(report.sources.is_empty());
        let replay = provider.last_request();
        assert!(replay.last().unwrap().content.contains("Error executing search"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_any_call() {
        let mut scripted = ScriptedProvider::texts(Protocol::Pattern, &["Final Answer: unreachable"]);
        scripted.configured = false;
        let provider = Arc::new(scripted);
        let search = Arc::new(ScriptedSearch::new(Vec::new()));
        let err = agent(&provider, &search, 5)
            .run_turn("q", &[], TurnEvents::none(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_config());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_timeout_is_fatal() {
        let mut scripted = ScriptedProvider::texts(Protocol::Pattern, &["Final Answer: late"]);
        scripted.delay = Some(Duration::from_secs(5));
        let provider = Arc::new(scripted);
        let search = Arc::new(ScriptedSearch::new(Vec::new()));
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .search(search)
            .call_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let err = agent
            .run_turn("q", &[], TurnEvents::none(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let provider = Arc::new(ScriptedProvider::texts(Protocol::Pattern, &["Final Answer: no"]));
        let search = Arc::new(ScriptedSearch::new(Vec::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = agent(&provider, &search, 5)
            .run_turn("q", &[], TurnEvents::none(), &cancel)
            .await
            .unwrap();
        assert!(report.outcome.is_aborted());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_search() {
        let provider = Arc::new(ScriptedProvider::texts(
            Protocol::Pattern,
            &["Thought: search\nAction: search_database(\"Narada\")", "Final Answer: too late"],
        ));
        let mut scripted = ScriptedSearch::new(vec![Ok(vec![chunk("sb.1.5.1", "Narada")])]);
        scripted.delay = Some(Duration::from_secs(30));
        let search = Arc::new(scripted);
        let agent = agent(&provider, &search, 5);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let report = agent
            .run_turn("Who is Narada?", &[], TurnEvents::none(), &cancel)
            .await
            .unwrap();
        assert!(report.outcome.is_aborted());
        assert_eq!(provider.calls(), 1);
        assert!(report.sources.is_empty());
    }

    #[test]
    fn test_builder_requires_provider_and_search() {
        let search = Arc::new(ScriptedSearch::new(Vec::new()));
        assert!(matches!(AgentBuilder::new().search(search).build(), Err(e) if e.is_config()));

        let provider = Arc::new(ScriptedProvider::new(Protocol::ToolCalling, Vec::new()));
        assert!(matches!(AgentBuilder::new().provider(provider).build(), Err(AgentError::Config(_))));
    }
}
