//! Mock Scripture Search
//!
//! For offline demos and tests. Serves a few well-known verses by keyword.

use async_trait::async_trait;
use shuka_core::{Result, SourceChunk, tool::SearchTool};

/// (id, book, chapter, verse, score, text, keywords)
type DemoVerse = (&'static str, &'static str, i64, i64, f64, &'static str, &'static [&'static str]);

const DEMO_VERSES: &[DemoVerse] = &[
    (
        "bg.2.13",
        "Bhagavad Gita",
        2,
        13,
        0.95,
        "As the embodied soul continuously passes, in this body, from boyhood to youth to old age, \
         the soul similarly passes into another body at death. A sober person is not bewildered by such a change.",
        &["soul", "body", "death", "душа", "тело", "смерть"],
    ),
    (
        "bg.2.20",
        "Bhagavad Gita",
        2,
        20,
        0.89,
        "For the soul there is neither birth nor death at any time. He has not come into being, \
         does not come into being, and will not come into being. He is unborn, eternal, ever-existing \
         and primeval. He is not slain when the body is slain.",
        &["soul", "birth", "death", "eternal", "душа", "рождение", "вечн"],
    ),
    (
        "bg.4.7",
        "Bhagavad Gita",
        4,
        7,
        0.82,
        "Whenever and wherever there is a decline in religious practice, O descendant of Bharata, \
         and a predominant rise of irreligion, at that time I descend Myself.",
        &["avatar", "descend", "religion", "dharma", "irreligion", "аватар", "дхарм", "религи"],
    ),
    (
        "sb.1.1.1",
        "Srimad Bhagavatam",
        1,
        1,
        0.75,
        "O my Lord, Sri Krishna, son of Vasudeva, O all-pervading Personality of Godhead, I offer my \
         respectful obeisances unto You. I meditate upon Lord Sri Krishna because He is the Absolute \
         Truth and the primeval cause of all causes of the creation, sustenance and destruction of the \
         manifested universes.",
        &["krishna", "vasudeva", "absolute", "truth", "creation", "кришн", "васудев", "истин"],
    ),
];

/// Keyword search over a built-in demo corpus
#[derive(Default)]
pub struct MockScriptureSearch;

impl MockScriptureSearch {
    pub const fn new() -> Self {
        Self
    }

    fn chunk(verse: &DemoVerse) -> SourceChunk {
        let (id, book, chapter, number, score, text, _) = *verse;
        let mut chunk = SourceChunk::new(book, Some(chapter.into()), Some(number.into()), text, score);
        chunk.id = id.to_string();
        chunk
    }

    /// Verses whose keywords or text match any query word
    pub fn lookup(query: &str) -> Vec<SourceChunk> {
        let words: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2)
            .map(str::to_lowercase)
            .collect();

        DEMO_VERSES
            .iter()
            .filter(|(_, _, _, _, _, text, keywords)| {
                let text = text.to_lowercase();
                words
                    .iter()
                    .any(|w| text.contains(w.as_str()) || keywords.iter().any(|k| w.starts_with(k)))
            })
            .map(Self::chunk)
            .collect()
    }
}

#[async_trait]
impl SearchTool for MockScriptureSearch {
    async fn search(&self, query: &str) -> Result<Vec<SourceChunk>> {
        let chunks = Self::lookup(query);
        tracing::debug!(query, results = chunks.len(), "demo corpus search");
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "demo-corpus"
    }
}
