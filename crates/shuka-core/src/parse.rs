//! ReAct Response Parsing
//!
//! Recovers `Thought:`, `Action: search_database("...")` and
//! `Final Answer:` spans from free model text. Pattern based, not a
//! grammar: every piece is optional and they may appear together.

use once_cell::sync::Lazy;
use regex::Regex;

static THOUGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)Thought:\s*(.*?)(?:\n\s*Action:|\n\s*Final Answer:|\z)").expect("valid regex")
});

static ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)Action:\s*search_database\s*\(\s*(?:"([^"]*)"|'([^']*)')\s*\)"#)
        .expect("valid regex")
});

static FINAL_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)Final Answer:\s*(.*)").expect("valid regex"));

/// Pieces recovered from one model response
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReactParse {
    pub thought: Option<String>,
    /// Search query inside `search_database(...)`
    pub action: Option<String>,
    pub final_answer: Option<String>,
}

impl ReactParse {
    /// Neither an action nor a final answer
    pub const fn is_inconclusive(&self) -> bool {
        self.action.is_none() && self.final_answer.is_none()
    }
}

/// Parse a model response
pub fn parse_react(text: &str) -> ReactParse {
    let thought = THOUGHT
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    let action = ACTION.captures(text).and_then(|c| {
        c.get(1)
            .or_else(|| c.get(2))
            .map(|m| m.as_str().trim().to_string())
    });

    let final_answer = final_answer(text);

    ReactParse {
        thought,
        action,
        final_answer,
    }
}

/// Text after the first `Final Answer:` marker, trimmed
pub fn final_answer(text: &str) -> Option<String> {
    FINAL_ANSWER
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}
