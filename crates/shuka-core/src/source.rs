//! Scripture Sources
//!
//! Retrieved passages and the per-turn accumulator that deduplicates them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Chapter or verse locator; the backend sends either numbers or
/// strings (a chapter may encode a path such as `"1/2/3"`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Locator {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A unit of retrieved scripture text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceChunk {
    /// Citation token, stable per (book, chapter, verse)
    pub id: String,

    pub book_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<Locator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse: Option<Locator>,

    /// Fallback location when chapter/verse are absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    pub content: String,

    /// Backend relevance in [0, 1]; never recomputed here
    #[serde(default)]
    pub score: f64,
}

impl SourceChunk {
    /// Build a chunk whose id is synthesized from book, chapter and verse
    pub fn new(
        book_title: impl Into<String>,
        chapter: Option<Locator>,
        verse: Option<Locator>,
        content: impl Into<String>,
        score: f64,
    ) -> Self {
        let book_title = book_title.into();
        let id = Self::make_id(&book_title, chapter.as_ref(), verse.as_ref());
        Self {
            id,
            book_title,
            chapter,
            verse,
            page_number: None,
            content: content.into(),
            score,
        }
    }

    /// Deterministic id: whitespace-stripped lower-cased book name,
    /// then chapter and verse, dot separated. Missing parts become `-`.
    pub fn make_id(book: &str, chapter: Option<&Locator>, verse: Option<&Locator>) -> String {
        let book: String = book
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        let book = if book.is_empty() { "unknown".to_string() } else { book };
        let part = |l: Option<&Locator>| l.map_or_else(|| "-".to_string(), ToString::to_string);
        format!("{book}.{}.{}", part(chapter), part(verse))
    }

    /// Human-readable location: `2:13`, `2`, `p. 42` or empty
    pub fn location(&self) -> String {
        match (&self.chapter, &self.verse, self.page_number) {
            (Some(c), Some(v), _) => format!("{c}:{v}"),
            (Some(c), None, _) => c.to_string(),
            (None, Some(v), _) => v.to_string(),
            (None, None, Some(p)) => format!("p. {p}"),
            (None, None, None) => String::new(),
        }
    }

    /// `<book> <location>` header used in observations
    pub fn reference(&self) -> String {
        let location = self.location();
        if location.is_empty() {
            self.book_title.clone()
        } else {
            format!("{} {location}", self.book_title)
        }
    }
}

/// Per-turn source accumulator.
///
/// Every search batch is absorbed; ids are kept unique (last value wins,
/// first-seen order is preserved) and each id is reported as new exactly
/// once.
#[derive(Debug, Default)]
pub struct SourceLedger {
    chunks: Vec<SourceChunk>,
    index: HashMap<String, usize>,
}

impl SourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb a batch, returning the chunks whose ids were not seen before
    pub fn absorb(&mut self, batch: &[SourceChunk]) -> Vec<SourceChunk> {
        let mut fresh = Vec::new();
        for chunk in batch {
            if let Some(&pos) = self.index.get(&chunk.id) {
                self.chunks[pos] = chunk.clone();
            } else {
                self.index.insert(chunk.id.clone(), self.chunks.len());
                self.chunks.push(chunk.clone());
                fresh.push(chunk.clone());
            }
        }
        fresh
    }

    pub fn sources(&self) -> &[SourceChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn into_sources(self) -> Vec<SourceChunk> {
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, content: &str) -> SourceChunk {
        SourceChunk {
            id: id.into(),
            book_title: "Srimad Bhagavatam".into(),
            chapter: Some(1_i64.into()),
            verse: Some(1_i64.into()),
            page_number: None,
            content: content.into(),
            score: 0.5,
        }
    }

    #[test]
    fn test_id_is_deterministic() {
        let a = SourceChunk::make_id("Bhagavad Gita", Some(&2.into()), Some(&13.into()));
        let b = SourceChunk::make_id("bhagavad  gita", Some(&2.into()), Some(&13.into()));
        assert_eq!(a, "bhagavadgita.2.13");
        assert_eq!(a, b);
    }

    #[test]
    fn test_id_differs_per_triple() {
        let base = SourceChunk::make_id("Bhagavad Gita", Some(&2.into()), Some(&13.into()));
        assert_ne!(base, SourceChunk::make_id("Bhagavad Gita", Some(&2.into()), Some(&14.into())));
        assert_ne!(base, SourceChunk::make_id("Bhagavad Gita", Some(&3.into()), Some(&13.into())));
        assert_ne!(base, SourceChunk::make_id("Isopanisad", Some(&2.into()), Some(&13.into())));
        assert_ne!(
            SourceChunk::make_id("SB", Some(&"1/2".into()), None),
            SourceChunk::make_id("SB", Some(&"1/2".into()), Some(&"-1".into()))
        );
    }

    #[test]
    fn test_location_fallbacks() {
        let mut c = SourceChunk::new("Upanishads", None, None, "Truth alone triumphs", 0.8);
        assert_eq!(c.reference(), "Upanishads");
        c.page_number = Some(42);
        assert_eq!(c.location(), "p. 42");
        c.chapter = Some("1/2/3".into());
        assert_eq!(c.reference(), "Upanishads 1/2/3");
    }

    #[test]
    fn test_ledger_dedup_across_batches() {
        let mut ledger = SourceLedger::new();
        let first = ledger.absorb(&[chunk("sb.1.1.1", "a"), chunk("sb.1.1.2", "b")]);
        let second = ledger.absorb(&[chunk("sb.1.1.1", "a2")]);

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(ledger.len(), 2);
        // last value wins, first-seen order kept
        assert_eq!(ledger.sources()[0].content, "a2");
        assert_eq!(ledger.sources()[1].id, "sb.1.1.2");
    }

    #[test]
    fn test_ledger_dedup_within_batch() {
        let mut ledger = SourceLedger::new();
        let fresh = ledger.absorb(&[chunk("bg.2.13", "x"), chunk("bg.2.13", "y")]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(ledger.sources()[0].content, "y");
    }

    #[test]
    fn test_chunk_wire_shape() {
        let json = r#"{"id":"bg.2.13","bookTitle":"Bhagavad Gita","chapter":2,"verse":"13","content":"...","score":0.9}"#;
        let c: SourceChunk = serde_json::from_str(json).unwrap();
        assert_eq!(c.chapter, Some(Locator::Number(2)));
        assert_eq!(c.verse, Some(Locator::Text("13".into())));
        assert_eq!(c.location(), "2:13");
    }
}
