//! Tool protocol: the provider tracks turn structure itself and returns
//! either assistant content or structured `tool_calls`.

use crate::message::{Message, MessageList};
use crate::parse::final_answer;
use crate::prompt::{EMPTY_ANSWER_FALLBACK, FORCED_SYNTHESIS_PROMPT, NO_RESULTS, SYNTHESIS_FALLBACK, tool_system_prompt};
use crate::provider::{Completion, GenerationOptions};
use crate::step::{StepKind, StepLog};
use crate::tool::{SEARCH_TOOL_NAME, ToolSchema};

use super::{Directive, ModelRequest, SearchOutcome, SearchRequest, Transcript, TurnContext};

/// Message-list transcript for tool-calling providers
#[derive(Clone, Debug)]
pub struct ToolTranscript {
    messages: MessageList,
    options: GenerationOptions,
    /// Latest non-blank assistant content of this turn
    last_content: Option<String>,
}

impl ToolTranscript {
    pub fn new(ctx: &TurnContext<'_>) -> Self {
        let mut messages = MessageList::with_system_prompt(tool_system_prompt(ctx.language));
        messages.extend(ctx.history.iter().cloned());
        messages.push(Message::user(ctx.query));

        let options = GenerationOptions {
            system_prompt: None,
            stop_sequences: Vec::new(),
            tools: vec![ToolSchema::search_database()],
            ..ctx.generation.clone()
        };

        Self {
            messages,
            options,
            last_content: None,
        }
    }

    pub fn messages(&self) -> &MessageList {
        &self.messages
    }
}

/// `[[id]] <book> <chapter>:<verse> - "<content>"` per result
pub fn format_tool_result(outcome: &SearchOutcome) -> String {
    let chunks = outcome.chunks();
    if chunks.is_empty() {
        return NO_RESULTS.to_string();
    }
    chunks
        .iter()
        .map(|c| format!("[[{}]] {} - \"{}\"", c.id, c.reference(), c.content))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Transcript for ToolTranscript {
    fn next_request(&self) -> ModelRequest {
        ModelRequest {
            messages: self.messages.messages().to_vec(),
            options: self.options.clone(),
        }
    }

    fn absorb(&mut self, completion: Completion, log: &mut StepLog) -> Directive {
        let Completion { content, tool_calls, .. } = completion;
        self.messages
            .push(Message::assistant_with_calls(content.clone(), tool_calls.clone()));

        let content = content.trim();
        if tool_calls.is_empty() {
            if content.is_empty() {
                return Directive::Final(EMPTY_ANSWER_FALLBACK.to_string());
            }
            return Directive::Final(content.to_string());
        }

        if !content.is_empty() {
            log.push(StepKind::Thought, content);
            self.last_content = Some(content.to_string());
        }

        let mut requests = Vec::new();
        for call in tool_calls {
            if call.name != SEARCH_TOOL_NAME {
                tracing::warn!(tool = %call.name, "model called an unknown tool");
                self.messages.push(Message::tool(
                    format!("Error: unknown tool '{}'. Only {SEARCH_TOOL_NAME} is available.", call.name),
                    Some(call.id),
                ));
                continue;
            }
            let query = call
                .str_arg("query")
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(ToString::to_string);
            match query {
                Some(query) => requests.push(SearchRequest {
                    call_id: Some(call.id),
                    query,
                }),
                None => {
                    tracing::warn!(arguments = %call.raw_arguments(), "tool call without a usable query");
                    self.messages.push(Message::tool(
                        "Error: the required string argument 'query' is missing or invalid.",
                        Some(call.id),
                    ));
                }
            }
        }

        if requests.is_empty() {
            Directive::Continue
        } else {
            Directive::Search(requests)
        }
    }

    fn record_observation(&mut self, request: &SearchRequest, outcome: &SearchOutcome) {
        self.messages
            .push(Message::tool(format_tool_result(outcome), request.call_id.clone()));
    }

    fn synthesis_request(&self) -> ModelRequest {
        let mut messages = self.messages.messages().to_vec();
        messages.push(Message::user(FORCED_SYNTHESIS_PROMPT));
        ModelRequest {
            messages,
            options: GenerationOptions {
                tools: Vec::new(),
                ..self.options.clone()
            },
        }
    }

    fn finish_synthesis(&self, completion: Completion) -> String {
        let answer = final_answer(&completion.content)
            .unwrap_or_else(|| completion.content.trim().to_string());
        if answer.is_empty() {
            self.synthesis_fallback()
        } else {
            answer
        }
    }

    fn synthesis_fallback(&self) -> String {
        self.last_content
            .clone()
            .unwrap_or_else(|| SYNTHESIS_FALLBACK.to_string())
    }
}
