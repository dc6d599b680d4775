//! Application state for the RAG server

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::pipeline::QueryPipeline;
use crate::providers::{
    ChromaVectorStore, EmbeddingProvider, LlmProvider, OllamaEmbedder, OpenAiClient,
    VectorStoreProvider,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Vector store, absent when it failed to initialize
    vector_store: Option<Arc<dyn VectorStoreProvider>>,
    /// Completion client, absent when no API key was configured
    llm: Option<Arc<dyn LlmProvider>>,
    /// Response cache shared by all requests
    cache: Arc<ResponseCache>,
}

impl AppState {
    /// Create application state, connecting to the collaborators
    ///
    /// A collaborator that fails to initialize is logged and left out; the
    /// server still starts and the endpoints needing it answer 503.
    pub async fn new(config: RagConfig) -> Self {
        tracing::info!("Initializing Mia RAG application state...");

        let vector_store = match Self::connect_vector_store(&config).await {
            Ok(store) => {
                tracing::info!(
                    "Vector database loaded (collection '{}' at {})",
                    config.vector_db.collection,
                    config.vector_db.url
                );
                Some(store)
            }
            Err(e) => {
                tracing::error!("Failed to load vector database: {}", e);
                None
            }
        };

        let llm: Option<Arc<dyn LlmProvider>> = match OpenAiClient::new(&config.llm) {
            Ok(client) => {
                tracing::info!("OpenAI client initialized (model: {})", client.model());
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!("OpenAI client not configured: {}", e);
                None
            }
        };

        let cache = Arc::new(ResponseCache::new(config.cache.max_entries));
        tracing::info!("Response cache initialized ({} entries max)", cache.capacity());

        Self::from_parts(config, vector_store, llm, cache)
    }

    /// Assemble state from already built parts
    pub fn from_parts(
        config: RagConfig,
        vector_store: Option<Arc<dyn VectorStoreProvider>>,
        llm: Option<Arc<dyn LlmProvider>>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                vector_store,
                llm,
                cache,
            }),
        }
    }

    async fn connect_vector_store(config: &RagConfig) -> Result<Arc<dyn VectorStoreProvider>> {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
        tracing::info!(
            "Embedding provider: {} (model: {})",
            embedder.name(),
            config.embeddings.model
        );
        if !embedder.health_check().await.unwrap_or(false) {
            tracing::warn!(
                "Embedding service not reachable at {}; queries will fail until it is up",
                config.embeddings.base_url
            );
        }
        let store = ChromaVectorStore::connect(&config.vector_db, embedder).await?;
        Ok(Arc::new(store))
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the vector store, if it initialized
    pub fn vector_store(&self) -> Option<&Arc<dyn VectorStoreProvider>> {
        self.inner.vector_store.as_ref()
    }

    /// Get the completion client, if it initialized
    pub fn llm(&self) -> Option<&Arc<dyn LlmProvider>> {
        self.inner.llm.as_ref()
    }

    /// Get the response cache
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.inner.cache
    }

    /// True when every collaborator initialized
    pub fn is_ready(&self) -> bool {
        self.inner.vector_store.is_some() && self.inner.llm.is_some()
    }

    /// Query pipeline over the initialized collaborators
    pub fn pipeline(&self) -> Result<QueryPipeline> {
        match (&self.inner.vector_store, &self.inner.llm) {
            (Some(store), Some(llm)) => Ok(QueryPipeline::new(
                Arc::clone(store),
                Arc::clone(llm),
                Arc::clone(&self.inner.cache),
                self.inner.config.query.clone(),
            )),
            _ => Err(Error::unavailable("Service not fully initialized")),
        }
    }

    /// Check collaborator reachability and log the outcome
    pub async fn probe(&self) {
        if let Some(store) = self.vector_store() {
            match store.len().await {
                Ok(count) => tracing::info!("{} collection holds {} chunks", store.name(), count),
                Err(e) => tracing::warn!("Could not count {} chunks: {}", store.name(), e),
            }
        }

        if let Some(llm) = self.llm() {
            if llm.health_check().await.unwrap_or(false) {
                tracing::info!("{} API reachable", llm.name());
            } else {
                tracing::warn!("{} API not reachable; answers will fail", llm.name());
            }
        }
    }

    /// Vector store for retrieval-only search
    pub fn search_store(&self) -> Result<&Arc<dyn VectorStoreProvider>> {
        self.vector_store()
            .ok_or_else(|| Error::unavailable("Database not loaded"))
    }
}
