//! Response types for the query and search endpoints

use serde::{Deserialize, Serialize};

use super::chunk::{RetrievedChunk, Source};

/// Characters of chunk content shown in a search preview
pub const PREVIEW_CHARS: usize = 500;

/// Answer payload, also the value stored in the response cache
///
/// The stored copy always has `cached == false`; only the copy handed out on a
/// cache hit is flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub success: bool,
    /// Generated answer
    pub answer: String,
    /// Sources in retrieval order
    pub sources: Vec<Source>,
    /// The question, verbatim
    pub question: String,
    /// Language tag the answer was requested in
    pub language: String,
    /// Whether this copy came from the cache
    pub cached: bool,
}

impl CachedResponse {
    /// Fresh (uncached) answer
    pub fn new(
        answer: impl Into<String>,
        sources: Vec<Source>,
        question: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            answer: answer.into(),
            sources,
            question: question.into(),
            language: language.into(),
            cached: false,
        }
    }

    /// Copy handed out on a cache hit
    pub fn as_cache_hit(&self) -> Self {
        Self {
            cached: true,
            ..self.clone()
        }
    }
}

/// One retrieval-only search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Truncated content preview
    pub content: String,
    /// Base name of the source document
    pub source: String,
    pub page: Option<u32>,
}

impl From<&RetrievedChunk> for SearchHit {
    fn from(chunk: &RetrievedChunk) -> Self {
        Self {
            content: preview(&chunk.content, PREVIEW_CHARS),
            source: chunk.file_name().to_string(),
            page: chunk.page,
        }
    }
}

/// Response of `POST /search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<SearchHit>,
    pub query: String,
    pub count: usize,
}

impl SearchResponse {
    pub fn new(query: impl Into<String>, results: Vec<SearchHit>) -> Self {
        Self {
            success: true,
            count: results.len(),
            results,
            query: query.into(),
        }
    }
}

/// First `max_chars` characters followed by `...`
///
/// The ellipsis is appended unconditionally, so short chunks read the same way
/// as long ones in a result list. Cuts on character boundaries.
pub fn preview(content: &str, max_chars: usize) -> String {
    let end = content
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(content.len());
    format!("{}...", &content[..end])
}
