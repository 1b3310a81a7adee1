//! Scripture Search Adapter
//!
//! Calls the HTTP search backend and maps its rows into [`SourceChunk`]s.
//! Non-2xx answers and `success: false` become an empty result so the
//! agent can reason about missing evidence; only transport failures are
//! reported as errors.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shuka_core::{
    AgentError, Language, Locator, Settings, SourceChunk,
    settings::DEFAULT_TOP_K,
    tool::SearchTool,
};

use crate::error::{BackendError, Result};

/// Search adapter configuration
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Full search endpoint, e.g. `http://localhost:5000/api/search`
    pub url: String,

    pub top_k: usize,

    /// Used when the query has no Cyrillic letters
    pub language: Language,

    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            top_k: DEFAULT_TOP_K,
            language: Language::En,
            timeout_secs: 120,
        }
    }
}

impl SearchConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            url: settings.backend_url.clone(),
            top_k: settings.top_k,
            language: settings.language,
            timeout_secs: settings.call_timeout_secs,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    language: Language,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchRow {
    id: Option<String>,
    book: Option<String>,
    #[serde(default, deserialize_with = "loose_locator")]
    chapter: Option<Locator>,
    #[serde(default, deserialize_with = "loose_locator")]
    verse: Option<Locator>,
    #[serde(default)]
    text: Option<String>,
    score: Option<f64>,
    final_score: Option<f64>,
}

/// Rows are decoded one by one so a malformed row cannot sink the batch
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    results: Vec<serde_json::Value>,
    error: Option<String>,
}

/// Integers and strings as-is; integral floats as numbers, others as text
fn loose_locator<'de, D>(deserializer: D) -> std::result::Result<Option<Locator>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(Locator::Number(i)),
            #[allow(clippy::cast_possible_truncation)]
            (None, Some(f)) if f.fract().abs() < f64::EPSILON && f.abs() < 9.0e15 => Some(Locator::Number(f as i64)),
            _ => Some(Locator::Text(n.to_string())),
        },
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(Locator::Text(s)),
        _ => None,
    })
}

impl SearchRow {
    fn into_chunk(self) -> SourceChunk {
        let book_title = self
            .book
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        let score = self
            .final_score
            .filter(|s| *s > 0.0)
            .or(self.score)
            .unwrap_or(0.0);
        let content = self.text.unwrap_or_default();
        let mut chunk = SourceChunk::new(book_title, self.chapter, self.verse, content, score);
        if let Some(id) = self.id.filter(|id| !id.trim().is_empty()) {
            chunk.id = id;
        }
        chunk
    }
}

/// Interpret one backend answer
pub fn interpret_response(status: u16, body: &str) -> Result<Vec<SourceChunk>> {
    if !(200..300).contains(&status) {
        return Err(BackendError::Status {
            status,
            body: body.chars().take(200).collect(),
        });
    }
    let response: SearchResponse = serde_json::from_str(body)?;
    if !response.success {
        return Err(BackendError::Backend(
            response.error.unwrap_or_else(|| "Unknown error from backend".into()),
        ));
    }
    Ok(response
        .results
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| match serde_json::from_value::<SearchRow>(row) {
            Ok(row) => Some(row.into_chunk()),
            Err(e) => {
                tracing::warn!(row = i, error = %e, "skipping malformed search row");
                None
            }
        })
        .collect())
}

/// HTTP scripture search
pub struct HttpScriptureSearch {
    client: reqwest::Client,
    config: SearchConfig,
}

impl HttpScriptureSearch {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(SearchConfig::from_settings(settings))
    }

    fn request<'a>(&self, query: &'a str) -> SearchRequest<'a> {
        SearchRequest {
            query,
            language: Language::detect(query, self.config.language),
            top_k: self.config.top_k,
        }
    }

    /// One request, every failure reported
    pub async fn fetch(&self, query: &str) -> Result<Vec<SourceChunk>> {
        let body = self.request(query);
        tracing::debug!(query, language = %body.language, top_k = body.top_k, "scripture search");

        let response = self.client.post(&self.config.url).json(&body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        interpret_response(status, &text)
    }
}

#[async_trait]
impl SearchTool for HttpScriptureSearch {
    fn ensure_configured(&self) -> shuka_core::Result<()> {
        if self.config.url.trim().is_empty() {
            return Err(AgentError::Config("Backend URL is not set".into()));
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> shuka_core::Result<Vec<SourceChunk>> {
        match self.fetch(query).await {
            Ok(chunks) => {
                tracing::debug!(query, results = chunks.len(), "search finished");
                Ok(chunks)
            }
            Err(e) if e.is_soft() => {
                tracing::warn!(query, error = %e, "search backend failed; returning no results");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "scripture-backend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_map_to_chunks() {
        let body = r#"{
            "success": true,
            "results": [
                {"book": "Srimad Bhagavatam", "chapter": 10, "verse": 1, "text": "Kamsa...", "score": 0.4, "final_score": 0.81},
                {"book": "Bhagavad Gita", "chapter": "2", "verse": 13, "text": "As the embodied soul...", "score": 0.7},
                {"id": "cc.madhya.20.108", "book": "Caitanya Caritamrta", "chapter": "Madhya 20", "verse": 108, "text": "jivera svarupa"}
            ]
        }"#;
        let chunks = interpret_response(200, body).unwrap();

        assert_eq!(chunks[0].id, "srimadbhagavatam.10.1");
        assert!((chunks[0].score - 0.81).abs() < f64::EPSILON);
        assert_eq!(chunks[1].id, "bhagavadgita.2.13");
        assert!((chunks[1].score - 0.7).abs() < f64::EPSILON);
        assert_eq!(chunks[2].id, "cc.madhya.20.108");
        assert_eq!(chunks[2].score, 0.0);
    }

    #[test]
    fn test_same_triple_same_id() {
        let body = r#"{"success": true, "results": [
            {"book": "Bhagavad  Gita", "chapter": 2, "verse": 13, "text": "a"},
            {"book": "bhagavad gita", "chapter": 2, "verse": 13, "text": "b"},
            {"book": "Bhagavad Gita", "chapter": 2, "verse": 14, "text": "c"}
        ]}"#;
        let chunks = interpret_response(200, body).unwrap();
        assert_eq!(chunks[0].id, chunks[1].id);
        assert_ne!(chunks[0].id, chunks[2].id);
    }

    #[test]
    fn test_malformed_row_does_not_sink_batch() {
        let body = r#"{"success": true, "results": [
            {"book": "Bhagavad Gita", "chapter": 2, "verse": 13, "text": "ok"},
            {"book": "Bhagavad Gita", "chapter": 2, "verse": 14, "text": null},
            {"book": "Srimad Bhagavatam", "chapter": 1.0, "verse": 2.5, "text": "float locators"},
            {"book": ["not", "a", "string"], "text": "bad"}
        ]}"#;
        let chunks = interpret_response(200, body).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content, "ok");
        assert_eq!(chunks[1].id, "bhagavadgita.2.14");
        assert!(chunks[1].content.is_empty());
        assert_eq!(chunks[2].chapter, Some(Locator::Number(1)));
        assert_eq!(chunks[2].verse, Some(Locator::Text("2.5".into())));
    }

    #[test]
    fn test_request_body_language_and_top_k() {
        let search = HttpScriptureSearch::new(SearchConfig {
            url: "http://localhost:5000/api/search".into(),
            top_k: 20,
            language: Language::En,
            ..Default::default()
        })
        .unwrap();

        let body = serde_json::to_value(search.request("Камса")).unwrap();
        assert_eq!(body, serde_json::json!({"query": "Камса", "language": "ru", "top_k": 20}));

        let body = serde_json::to_value(search.request("Kamsa")).unwrap();
        assert_eq!(body["language"], "en");
        assert_eq!(body["top_k"], 20);
    }

    #[test]
    fn test_failures_are_soft() {
        let err = interpret_response(500, "Internal Server Error").unwrap_err();
        assert!(err.is_soft());

        let err = interpret_response(200, r#"{"success": false, "error": "index not loaded"}"#).unwrap_err();
        assert!(err.is_soft());
        assert!(err.to_string().contains("index not loaded"));

        assert!(interpret_response(200, "not json").unwrap_err().is_soft());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let search = HttpScriptureSearch::new(SearchConfig {
            url: "http://127.0.0.1:9/api/search".into(),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        let err = search.search("dharma").await.unwrap_err();
        assert!(matches!(err, AgentError::Search(_)));
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let search = HttpScriptureSearch::new(SearchConfig::default()).unwrap();
        assert!(search.ensure_configured().unwrap_err().is_config());
    }
}
