//! Query orchestration: cache lookup, retrieval, prompt assembly, completion
//!
//! ```text
//! request ─▶ validate ─▶ cache hit? ──yes──▶ copy with cached=true
//!                            │ no
//!                            ▼
//!                        retrieve ─▶ assemble ─▶ complete ─▶ store ─▶ response
//! ```
//!
//! Concurrent misses for the same key are not merged; both compute an answer
//! and the later `put` wins.

use std::sync::Arc;

use crate::cache::{CacheKey, ResponseCache};
use crate::config::QueryConfig;
use crate::error::{Error, Result};
use crate::generation::{AnswerLanguage, ContextAssembler, PromptBuilder};
use crate::providers::{LlmProvider, VectorStoreProvider};
use crate::types::{
    CachedResponse, QueryRequest, SearchHit, SearchRequest, SearchResponse,
};

/// Characters of the question shown in log lines
const LOG_PREVIEW_CHARS: usize = 50;

/// Answers questions from retrieved context, with response caching
#[derive(Clone)]
pub struct QueryPipeline {
    vector_store: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    cache: Arc<ResponseCache>,
    settings: QueryConfig,
}

impl QueryPipeline {
    pub fn new(
        vector_store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        cache: Arc<ResponseCache>,
        settings: QueryConfig,
    ) -> Self {
        Self {
            vector_store,
            llm,
            cache,
            settings,
        }
    }

    /// The shared response cache
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Answer a question
    ///
    /// The cache is consulted and filled only when `use_cache` is set. The key
    /// covers just the question and language, so callers carrying conversation
    /// history should turn caching off. Nothing is stored unless the completion
    /// succeeded.
    pub async fn answer(&self, request: &QueryRequest) -> Result<CachedResponse> {
        let question = required_text(request.question.as_deref(), "Question is required")?;
        let language = request.language();
        let top_k = resolve_top_k(request.top_k, &self.settings)?;

        let cache_key = request
            .use_cache
            .then(|| CacheKey::derive(question, language));

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key) {
                tracing::info!("Cache hit for question: {}...", log_preview(question));
                return Ok(cached.as_cache_hit());
            }
        }

        tracing::info!("Processing question: {}...", log_preview(question));

        let chunks = self.vector_store.similarity_search(question, top_k).await?;
        if chunks.is_empty() {
            tracing::info!("No relevant documents for question: {}...", log_preview(question));
            return Err(Error::NoRelevantDocuments);
        }

        let assembled = ContextAssembler::assemble(&chunks);
        let messages = PromptBuilder::build_messages(
            question,
            &assembled.context,
            AnswerLanguage::from_tag(language),
            &request.conversation_history,
        );

        let answer = self.llm.chat(&messages).await?;
        let response = CachedResponse::new(answer, assembled.sources, question, language);

        if let Some(key) = cache_key {
            self.cache.put(key, response.clone());
        }

        tracing::info!(
            "Answered question with {} sources ({} cached entries)",
            response.sources.len(),
            self.cache.len()
        );

        Ok(response)
    }
}

/// Retrieval-only search with content previews; never calls the LLM
pub async fn search_documents(
    vector_store: &dyn VectorStoreProvider,
    request: &SearchRequest,
    settings: &QueryConfig,
) -> Result<SearchResponse> {
    let query = required_text(request.query.as_deref(), "Query is required")?;
    let top_k = resolve_top_k(request.top_k, settings)?;

    tracing::info!("Searching for: {}...", log_preview(query));

    let chunks = vector_store.similarity_search(query, top_k).await?;
    let results: Vec<SearchHit> = chunks.iter().map(SearchHit::from).collect();

    tracing::info!("Found {} documents", results.len());

    Ok(SearchResponse::new(query, results))
}

/// Reject absent or empty text fields; whitespace is passed through as-is
fn required_text<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    match value {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(Error::invalid_input(message)),
    }
}

/// Apply the default and cap a requested chunk count
fn resolve_top_k(requested: Option<usize>, settings: &QueryConfig) -> Result<usize> {
    match requested {
        None => Ok(settings.default_top_k.clamp(1, settings.max_top_k.max(1))),
        Some(0) => Err(Error::invalid_input("top_k must be at least 1")),
        Some(k) => Ok(k.min(settings.max_top_k.max(1))),
    }
}

fn log_preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{ChatMessage, RetrievedChunk, Role, Source};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Vector store returning a fixed chunk list (truncated to `top_k`)
    pub(crate) struct FakeStore {
        pub chunks: Vec<RetrievedChunk>,
        pub calls: AtomicUsize,
        pub last_top_k: AtomicUsize,
    }

    impl FakeStore {
        pub fn new(chunks: Vec<RetrievedChunk>) -> Self {
            Self {
                chunks,
                calls: AtomicUsize::new(0),
                last_top_k: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VectorStoreProvider for FakeStore {
        async fn similarity_search(
            &self,
            _query: &str,
            top_k: usize,
        ) -> Result<Vec<RetrievedChunk>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_top_k.store(top_k, Ordering::SeqCst);
            Ok(self.chunks.iter().take(top_k).cloned().collect())
        }

        async fn len(&self) -> Result<usize> {
            Ok(self.chunks.len())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    /// LLM answering with a counter-stamped reply, or failing on demand
    pub(crate) struct FakeLlm {
        pub fail: bool,
        pub calls: AtomicUsize,
        pub last_messages: Mutex<Vec<ChatMessage>>,
    }

    impl FakeLlm {
        pub fn new() -> Self {
            Self {
                fail: false,
                calls: AtomicUsize::new(0),
                last_messages: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for FakeLlm {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            *self.last_messages.lock() = messages.to_vec();
            if self.fail {
                return Err(Error::llm("Completion returned no content"));
            }
            Ok(format!("answer #{}", n))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-model"
        }
    }

    pub(crate) fn aspirin_chunks() -> Vec<RetrievedChunk> {
        vec![
            RetrievedChunk::new("Aspirin is an NSAID.", "data/pharmacology.pdf").with_page(12),
            RetrievedChunk::new("Aspirin inhibits COX-1.", "data/mechanisms.pdf").with_page(3),
            RetrievedChunk::new("Avoid in children.", "data/pediatrics.txt"),
        ]
    }

    fn pipeline(
        store: &Arc<FakeStore>,
        llm: &Arc<FakeLlm>,
        capacity: usize,
    ) -> QueryPipeline {
        QueryPipeline::new(
            store.clone(),
            llm.clone(),
            Arc::new(ResponseCache::new(capacity)),
            QueryConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);

        let request = QueryRequest::new("What is aspirin?")
            .with_language("en")
            .with_top_k(3);

        let first = pipeline.answer(&request).await.unwrap();
        assert!(first.success);
        assert!(!first.cached);
        assert_eq!(first.sources.len(), 3);
        assert_eq!(
            first.sources[0],
            Source { file: "pharmacology.pdf".into(), page: Some(12) }
        );
        assert_eq!(first.question, "What is aspirin?");
        assert_eq!(first.language, "en");

        let second = pipeline.answer(&request).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.answer, first.answer);
        assert_eq!(second.sources, first.sources);

        // The hit never reached the collaborators
        assert_eq!(store.calls(), 1);
        assert_eq!(llm.calls(), 1);

        // The stored copy keeps its origin state
        let key = CacheKey::derive("What is aspirin?", "en");
        assert!(!pipeline.cache().get(&key).unwrap().cached);
    }

    #[tokio::test]
    async fn test_no_documents_not_cached() {
        let store = Arc::new(FakeStore::new(vec![]));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);
        let request = QueryRequest::new("What is aspirin?");

        let result = pipeline.answer(&request).await;
        assert!(matches!(result, Err(Error::NoRelevantDocuments)));
        assert!(pipeline.cache().is_empty());
        assert_eq!(llm.calls(), 0);

        // No negative caching: retrieval runs again
        let _ = pipeline.answer(&request).await;
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_llm_failure_not_cached() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::failing());
        let pipeline = pipeline(&store, &llm, 100);

        let result = pipeline.answer(&QueryRequest::new("What is aspirin?")).await;
        assert!(matches!(result, Err(Error::Llm(_))));
        assert!(pipeline.cache().is_empty());
    }

    #[tokio::test]
    async fn test_use_cache_false_bypasses_and_preserves() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);
        let request = QueryRequest::new("What is aspirin?");

        let stored = pipeline.answer(&request).await.unwrap();

        let fresh = pipeline
            .answer(&request.clone().with_cache(false))
            .await
            .unwrap();
        assert!(!fresh.cached);
        assert_eq!(fresh.answer, "answer #2");
        assert_eq!(store.calls(), 2);
        assert_eq!(llm.calls(), 2);

        // Stored value untouched by the uncached request
        let key = CacheKey::derive("What is aspirin?", "en");
        assert_eq!(pipeline.cache().get(&key).unwrap(), stored);
    }

    #[tokio::test]
    async fn test_capacity_evicts_first_question() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);

        for i in 0..101 {
            pipeline
                .answer(&QueryRequest::new(format!("Question {}?", i)))
                .await
                .unwrap();
        }

        assert_eq!(pipeline.cache().len(), 100);
        assert!(pipeline
            .cache()
            .get(&CacheKey::derive("Question 0?", "en"))
            .is_none());
        assert!(pipeline
            .cache()
            .get(&CacheKey::derive("Question 100?", "en"))
            .is_some());
    }

    #[tokio::test]
    async fn test_language_separates_entries() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);

        pipeline
            .answer(&QueryRequest::new("What is aspirin?").with_language("en"))
            .await
            .unwrap();
        let persian = pipeline
            .answer(&QueryRequest::new("What is aspirin?").with_language("fa"))
            .await
            .unwrap();

        assert!(!persian.cached);
        assert_eq!(persian.language, "fa");
        assert_eq!(pipeline.cache().len(), 2);

        let messages = llm.last_messages.lock();
        assert!(messages[0].content.contains("Respond in Persian/Farsi"));
    }

    #[tokio::test]
    async fn test_prompt_layout() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);
        let history = vec![
            ChatMessage::user("What is ibuprofen?"),
            ChatMessage::assistant("An NSAID."),
        ];

        let response = pipeline
            .answer(&QueryRequest::new("And aspirin?").with_history(history))
            .await
            .unwrap();

        assert!(!response.cached);
        assert_eq!(pipeline.cache().len(), 1);

        let messages = llm.last_messages.lock();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Respond in English"));
        assert_eq!(messages[1].content, "What is ibuprofen?");
        let user = &messages[3].content;
        assert!(user.contains(
            "Aspirin is an NSAID.\n\n---\n\nAspirin inhibits COX-1.\n\n---\n\nAvoid in children."
        ));
        assert!(user.contains("Question: And aspirin?"));
    }

    #[tokio::test]
    async fn test_validation() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);

        let missing = pipeline.answer(&QueryRequest::default()).await;
        assert!(matches!(missing, Err(Error::InvalidInput(_))));

        let empty = pipeline.answer(&QueryRequest::new("")).await;
        assert!(matches!(empty, Err(Error::InvalidInput(_))));

        let zero = pipeline
            .answer(&QueryRequest::new("What is aspirin?").with_top_k(0))
            .await;
        assert!(matches!(zero, Err(Error::InvalidInput(_))));

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_question_reaches_retrieval() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);

        let response = pipeline.answer(&QueryRequest::new("   ")).await.unwrap();
        assert_eq!(response.question, "   ");
        assert_eq!(store.calls(), 1);

        // Not normalized: a distinct entry from the trimmed text
        assert!(pipeline.cache().get(&CacheKey::derive("   ", "en")).is_some());
        assert!(pipeline.cache().get(&CacheKey::derive("", "en")).is_none());
    }

    #[tokio::test]
    async fn test_history_still_served_from_cache() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);

        let first = pipeline
            .answer(&QueryRequest::new("What is aspirin?"))
            .await
            .unwrap();

        let with_history = QueryRequest::new("What is aspirin?")
            .with_history(vec![ChatMessage::user("hi")]);
        let second = pipeline.answer(&with_history).await.unwrap();

        assert!(second.cached);
        assert_eq!(second.answer, first.answer);
        assert_eq!(store.calls(), 1);
        assert_eq!(llm.calls(), 1);

        // Opting out still recomputes
        let fresh = pipeline
            .answer(&with_history.with_cache(false))
            .await
            .unwrap();
        assert!(!fresh.cached);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_top_k_defaults_and_cap() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 100);

        pipeline
            .answer(&QueryRequest::new("default k").with_cache(false))
            .await
            .unwrap();
        assert_eq!(store.last_top_k.load(Ordering::SeqCst), 5);

        pipeline
            .answer(&QueryRequest::new("huge k").with_top_k(10_000))
            .await
            .unwrap();
        assert_eq!(store.last_top_k.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let store = Arc::new(FakeStore::new(aspirin_chunks()));
        let llm = Arc::new(FakeLlm::new());
        let pipeline = pipeline(&store, &llm, 10);

        let tasks: Vec<_> = (0..40)
            .map(|i| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    pipeline
                        .answer(&QueryRequest::new(format!("Question {}?", i % 20)))
                        .await
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            assert!(result.unwrap().is_ok());
        }
        assert_eq!(pipeline.cache().len(), 10);
    }

    #[tokio::test]
    async fn test_search_previews() {
        let long = "x".repeat(700);
        let store = FakeStore::new(vec![
            RetrievedChunk::new(long, "data/long.pdf").with_page(1),
            RetrievedChunk::new("short", "short.txt"),
        ]);

        let response = search_documents(&store, &SearchRequest::new("aspirin"), &QueryConfig::default())
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.count, 2);
        assert_eq!(response.query, "aspirin");
        assert_eq!(response.results[0].content.chars().count(), 503);
        assert_eq!(response.results[0].source, "long.pdf");
        assert_eq!(response.results[1].content, "short...");
    }

    #[tokio::test]
    async fn test_search_empty_is_success() {
        let store = FakeStore::new(vec![]);
        let response = search_documents(&store, &SearchRequest::new("nothing"), &QueryConfig::default())
            .await
            .unwrap();
        assert_eq!(response.count, 0);

        let missing = search_documents(&store, &SearchRequest::default(), &QueryConfig::default()).await;
        assert!(matches!(missing, Err(Error::InvalidInput(_))));
    }
}
