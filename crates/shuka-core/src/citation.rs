//! Citation Markers
//!
//! Final answers cite sources inline as `[[<source-id>]]`. This module
//! normalizes the markers a model actually writes, splits an answer into
//! text and citation segments, and resolves citations against a turn's
//! sources. Unknown ids stay as unresolved segments.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::source::SourceChunk;

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("valid regex"));

/// `[[ID:x]]`, `[[ x ]]` and the observation echo `[ID:x]`
static LOOSE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[\s*(?:ID:\s*)?([^\[\]\n]+?)\s*\]\]|\[ID:\s*([^\[\]\n]+?)\s*\]").expect("valid regex")
});

/// A piece of an answer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Citation(&'a str),
}

/// A citation segment after lookup
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedSegment<'a> {
    Text { text: &'a str },
    /// `source` is `None` for an unknown id; render as an inert chip
    Citation { id: &'a str, source: Option<&'a SourceChunk> },
}

/// Rewrite loose citation forms into canonical `[[id]]`
pub fn normalize_markers(answer: &str) -> String {
    LOOSE_MARKER
        .replace_all(answer, |caps: &regex::Captures<'_>| {
            let id = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str().trim());
            format!("[[{id}]]")
        })
        .into_owned()
}

/// Split an answer into alternating text and citation segments.
/// Empty text pieces are dropped.
pub fn parse_segments(answer: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for caps in MARKER.captures_iter(answer) {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > cursor {
            segments.push(Segment::Text(&answer[cursor..whole.start()]));
        }
        segments.push(Segment::Citation(id.as_str()));
        cursor = whole.end();
    }
    if cursor < answer.len() {
        segments.push(Segment::Text(&answer[cursor..]));
    }
    segments
}

/// Resolve each citation by exact id match against `sources`
pub fn resolve_segments<'a>(answer: &'a str, sources: &'a [SourceChunk]) -> Vec<ResolvedSegment<'a>> {
    parse_segments(answer)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => ResolvedSegment::Text { text },
            Segment::Citation(id) => ResolvedSegment::Citation {
                id,
                source: sources.iter().find(|s| s.id == id),
            },
        })
        .collect()
}

/// Ids cited in the answer, in order of first appearance
pub fn cited_ids(answer: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    parse_segments(answer)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Citation(id) => Some(id),
            Segment::Text(_) => None,
        })
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Cited ids with no matching source
pub fn unresolved_citations<'a>(answer: &'a str, sources: &[SourceChunk]) -> Vec<&'a str> {
    cited_ids(answer)
        .into_iter()
        .filter(|id| !sources.iter().any(|s| s.id == *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str) -> SourceChunk {
        SourceChunk {
            id: id.into(),
            book_title: "Bhagavad Gita".into(),
            chapter: None,
            verse: None,
            page_number: None,
            content: String::new(),
            score: 1.0,
        }
    }

    #[test]
    fn test_parse_segments() {
        let segments = parse_segments("The soul is eternal [[bg.2.20]] and unborn [[bg.2.20]].");
        assert_eq!(
            segments,
            vec![
                Segment::Text("The soul is eternal "),
                Segment::Citation("bg.2.20"),
                Segment::Text(" and unborn "),
                Segment::Citation("bg.2.20"),
                Segment::Text("."),
            ]
        );
    }

    #[test]
    fn test_adjacent_markers() {
        let segments = parse_segments("[[a]][[b]]");
        assert_eq!(segments, vec![Segment::Citation("a"), Segment::Citation("b")]);
    }

    #[test]
    fn test_resolution_degrades_for_unknown_ids() {
        let sources = vec![source("bg.2.13")];
        let resolved = resolve_segments("See [[bg.2.13]] and [[sb.9.9.9]]", &sources);
        assert_eq!(resolved.len(), 4);
        assert!(matches!(resolved[1], ResolvedSegment::Citation { source: Some(_), .. }));
        assert!(matches!(resolved[3], ResolvedSegment::Citation { id: "sb.9.9.9", source: None }));
        assert_eq!(unresolved_citations("See [[bg.2.13]] and [[sb.9.9.9]]", &sources), vec!["sb.9.9.9"]);
    }

    #[test]
    fn test_normalize_markers() {
        assert_eq!(normalize_markers("x [[ID:bg.2.13]] y"), "x [[bg.2.13]] y");
        assert_eq!(normalize_markers("x [[ bg.2.13 ]] y"), "x [[bg.2.13]] y");
        assert_eq!(normalize_markers("x [ID:sb.1.1.1] y"), "x [[sb.1.1.1]] y");
        assert_eq!(normalize_markers("x [[bg.2.13]] y"), "x [[bg.2.13]] y");
        assert_eq!(normalize_markers("[link](http://a)"), "[link](http://a)");
    }

    #[test]
    fn test_cited_ids_unique_in_order() {
        assert_eq!(cited_ids("[[b]] [[a]] [[b]]"), vec!["b", "a"]);
    }
}
