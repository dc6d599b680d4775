//! Request types for the query and search endpoints

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// Language tag assumed when the caller sends none
pub const DEFAULT_LANGUAGE: &str = "en";

/// Question for the RAG pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer (required, must be non-empty)
    #[serde(default)]
    pub question: Option<String>,

    /// Answer language tag ("en", "fa", ...), default "en"
    #[serde(default)]
    pub language: Option<String>,

    /// Number of chunks to retrieve (server default when absent)
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Serve from and store into the response cache (default: true)
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,

    /// Prior conversation turns, oldest first
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

fn default_use_cache() -> bool {
    true
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            question: None,
            language: None,
            top_k: None,
            use_cache: true,
            conversation_history: Vec::new(),
        }
    }
}

impl QueryRequest {
    /// Create a new query
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            ..Default::default()
        }
    }

    /// Set the answer language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Enable or disable the response cache for this request
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Attach prior conversation turns
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.conversation_history = history;
        self
    }

    /// Language tag with the default applied
    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// Retrieval-only search request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Search text (required, must be non-empty)
    #[serde(default)]
    pub query: Option<String>,

    /// Number of chunks to retrieve (server default when absent)
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            top_k: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"question": "What is aspirin?"}"#).unwrap();

        assert_eq!(request.question.as_deref(), Some("What is aspirin?"));
        assert_eq!(request.language(), "en");
        assert_eq!(request.top_k, None);
        assert!(request.use_cache);
        assert!(request.conversation_history.is_empty());
    }

    #[test]
    fn test_request_full() {
        let request: QueryRequest = serde_json::from_str(
            r#"{
                "question": "Aspirin dose?",
                "language": "fa",
                "top_k": 3,
                "use_cache": false,
                "conversation_history": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(request.language(), "fa");
        assert_eq!(request.top_k, Some(3));
        assert!(!request.use_cache);
        assert_eq!(request.conversation_history.len(), 2);
        assert_eq!(request.conversation_history[1], ChatMessage::assistant("Hello"));
    }

    #[test]
    fn test_missing_question_parses() {
        let request: QueryRequest = serde_json::from_str(r#"{"language": "en"}"#).unwrap();
        assert!(request.question.is_none());
    }
}
