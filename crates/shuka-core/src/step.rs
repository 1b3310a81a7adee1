//! Agent Steps and Turn Events
//!
//! Observable ticks of one turn, recorded in order and optionally streamed
//! to a listener (UI, WebSocket) as they happen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::source::SourceChunk;

/// Kind of step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Thought,
    Action,
    Observation,
}

/// One observable tick of the loop
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    #[serde(rename = "type")]
    pub kind: StepKind,

    pub content: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl AgentStep {
    pub fn new(kind: StepKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Incremental notification for listeners
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Step { step: AgentStep },
    /// A source id seen for the first time this turn
    Source { source: SourceChunk },
}

/// Optional event channel for one turn
#[derive(Clone, Debug, Default)]
pub struct TurnEvents {
    sender: Option<mpsc::UnboundedSender<TurnEvent>>,
}

impl TurnEvents {
    /// No listener
    pub const fn none() -> Self {
        Self { sender: None }
    }

    /// Create a channel; the receiver goes to the listener
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TurnEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// Deliver an event; a dropped listener is not an error
    pub fn emit(&self, event: TurnEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

/// Append-only step record for one turn
#[derive(Debug, Default)]
pub struct StepLog {
    steps: Vec<AgentStep>,
    events: TurnEvents,
}

impl StepLog {
    pub const fn new(events: TurnEvents) -> Self {
        Self {
            steps: Vec::new(),
            events,
        }
    }

    /// Record a step and forward it to the listener
    pub fn push(&mut self, kind: StepKind, content: impl Into<String>) {
        let step = AgentStep::new(kind, content);
        tracing::debug!(kind = ?step.kind, content = %step.content, "agent step");
        self.events.emit(TurnEvent::Step { step: step.clone() });
        self.steps.push(step);
    }

    pub fn events(&self) -> &TurnEvents {
        &self.events
    }

    pub fn steps(&self) -> &[AgentStep] {
        &self.steps
    }

    pub fn count(&self, kind: StepKind) -> usize {
        self.steps.iter().filter(|s| s.kind == kind).count()
    }

    pub fn into_steps(self) -> Vec<AgentStep> {
        self.steps
    }
}
