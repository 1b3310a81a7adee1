//! Pattern protocol: the model writes `Thought:/Action:/Final Answer:` as
//! text and its whole transcript is replayed back as its own last turn.

use crate::message::Message;
use crate::parse::{final_answer, parse_react};
use crate::prompt::{EMPTY_ANSWER_FALLBACK, FORCED_SYNTHESIS_PROMPT, NO_RESULTS, OBSERVATION_STOP, SYNTHESIS_FALLBACK, pattern_system_prompt};
use crate::provider::{Completion, GenerationOptions, truncate_at_stop};
use crate::source::SourceChunk;
use crate::step::{StepKind, StepLog};

use super::{Directive, ModelRequest, SearchOutcome, SearchRequest, Transcript, TurnContext};

const SYNTHESIS_TEMPERATURE: f32 = 0.3;

/// Scratchpad transcript for text-completion providers
#[derive(Clone, Debug)]
pub struct PatternTranscript {
    query: String,
    history: Vec<Message>,
    options: GenerationOptions,
    scratchpad: String,
}

impl PatternTranscript {
    pub fn new(ctx: &TurnContext<'_>) -> Self {
        let options = GenerationOptions {
            system_prompt: Some(pattern_system_prompt(ctx.language)),
            stop_sequences: vec![OBSERVATION_STOP.to_string()],
            tools: Vec::new(),
            ..ctx.generation.clone()
        };
        Self {
            query: ctx.query.to_string(),
            history: ctx.history.to_vec(),
            options,
            scratchpad: String::new(),
        }
    }

    /// Everything the model has written plus injected observations
    pub fn scratchpad(&self) -> &str {
        &self.scratchpad
    }

    fn base_messages(&self) -> Vec<Message> {
        let mut messages = self.history.clone();
        messages.push(Message::user(self.query.clone()));
        messages.push(Message::assistant(self.scratchpad.clone()));
        messages
    }
}

/// `[ID:<id>] <book> <chapter>:<verse> - "<content>"` per result
pub fn format_observation(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Found(chunks) if chunks.is_empty() => format!("\n{OBSERVATION_STOP} {NO_RESULTS}\n\n"),
        SearchOutcome::Found(chunks) => {
            let lines: Vec<String> = chunks.iter().map(observation_line).collect();
            format!("\n{OBSERVATION_STOP} Found the following verses:\n{}\n\n", lines.join("\n"))
        }
        SearchOutcome::Failed(err) => format!("\n{OBSERVATION_STOP} Error executing search: {err}\n\n"),
    }
}

fn observation_line(chunk: &SourceChunk) -> String {
    format!("[ID:{}] {} - \"{}\"", chunk.id, chunk.reference(), chunk.content)
}

impl Transcript for PatternTranscript {
    fn next_request(&self) -> ModelRequest {
        ModelRequest {
            messages: self.base_messages(),
            options: self.options.clone(),
        }
    }

    fn absorb(&mut self, completion: Completion, log: &mut StepLog) -> Directive {
        let text = truncate_at_stop(&completion.content, &self.options.stop_sequences);
        self.scratchpad.push_str(text);

        let parsed = parse_react(text);
        if let Some(thought) = parsed.thought {
            log.push(StepKind::Thought, thought);
        }

        if let Some(answer) = parsed.final_answer {
            if answer.is_empty() {
                return Directive::Final(EMPTY_ANSWER_FALLBACK.to_string());
            }
            return Directive::Final(answer);
        }

        if let Some(query) = parsed.action {
            return Directive::Search(vec![SearchRequest { call_id: None, query }]);
        }

        if text.trim().is_empty() {
            return Directive::Stalled;
        }

        self.scratchpad.push('\n');
        Directive::Continue
    }

    fn record_observation(&mut self, _request: &SearchRequest, outcome: &SearchOutcome) {
        self.scratchpad.push_str(&format_observation(outcome));
    }

    fn synthesis_request(&self) -> ModelRequest {
        let mut messages = self.base_messages();
        messages.push(Message::user(FORCED_SYNTHESIS_PROMPT));
        ModelRequest {
            messages,
            options: GenerationOptions {
                temperature: SYNTHESIS_TEMPERATURE,
                stop_sequences: Vec::new(),
                ..self.options.clone()
            },
        }
    }

    fn finish_synthesis(&self, completion: Completion) -> String {
        match final_answer(&completion.content) {
            Some(answer) if !answer.is_empty() => answer,
            None if !completion.content.trim().is_empty() => completion.content,
            _ => self.synthesis_fallback(),
        }
    }

    fn synthesis_fallback(&self) -> String {
        SYNTHESIS_FALLBACK.to_string()
    }
}
