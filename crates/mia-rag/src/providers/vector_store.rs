//! Vector store provider trait for similarity search

use async_trait::async_trait;
use crate::error::Result;
use crate::types::RetrievedChunk;

/// Trait for similarity search over the indexed document chunks
///
/// Implementations:
/// - `ChromaVectorStore`: Chroma server collection, queried by embedding
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Up to `top_k` chunks most similar to `query`, most similar first
    async fn similarity_search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>>;

    /// Get total number of chunks stored
    async fn len(&self) -> Result<usize>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
