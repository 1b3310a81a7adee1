//! Protocol Transcripts
//!
//! Each provider protocol keeps its own turn state (a scratchpad string or
//! a native message list) and its own request/response shape. The
//! controller in [`crate::reasoning`] drives either through [`Transcript`]
//! and owns everything they share: the step budget, cancellation, search
//! execution and source accumulation.

mod pattern;
mod tool_calling;

pub use pattern::PatternTranscript;
pub use tool_calling::ToolTranscript;

use crate::message::Message;
use crate::provider::{Completion, GenerationOptions};
use crate::settings::Language;
use crate::source::SourceChunk;
use crate::step::StepLog;

/// Inputs fixed for the whole turn
#[derive(Clone, Copy, Debug)]
pub struct TurnContext<'a> {
    pub query: &'a str,
    pub history: &'a [Message],
    pub language: Language,
    pub generation: &'a GenerationOptions,
}

/// One provider call
#[derive(Clone, Debug)]
pub struct ModelRequest {
    pub messages: Vec<Message>,
    pub options: GenerationOptions,
}

/// A search the model asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    /// Tool call id (tool protocol only)
    pub call_id: Option<String>,
    pub query: String,
}

/// What a search produced
#[derive(Clone, Debug)]
pub enum SearchOutcome {
    Found(Vec<SourceChunk>),
    /// Transport failure or timeout; never fatal
    Failed(String),
}

impl SearchOutcome {
    pub fn chunks(&self) -> &[SourceChunk] {
        match self {
            Self::Found(chunks) => chunks,
            Self::Failed(_) => &[],
        }
    }
}

/// How the controller proceeds after a model response
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Turn is done
    Final(String),
    /// Run these searches in order, then call the model again
    Search(Vec<SearchRequest>),
    /// Nothing actionable; call the model again
    Continue,
    /// Model produced nothing; skip to forced synthesis
    Stalled,
}

/// Per-protocol turn state
pub trait Transcript: Send {
    /// Request for the next loop iteration
    fn next_request(&self) -> ModelRequest;

    /// Fold a model response into the transcript and decide what happens next
    fn absorb(&mut self, completion: Completion, log: &mut StepLog) -> Directive;

    /// Fold a search result into the transcript
    fn record_observation(&mut self, request: &SearchRequest, outcome: &SearchOutcome);

    /// Request for the single call made after the budget is spent
    fn synthesis_request(&self) -> ModelRequest;

    /// Extract the answer from the synthesis response
    fn finish_synthesis(&self, completion: Completion) -> String;

    /// Answer when the synthesis call itself failed
    fn synthesis_fallback(&self) -> String;
}
