//! Chroma vector store provider
//!
//! Talks to a Chroma server over its REST API. The collection is resolved by
//! name once at startup; queries are embedded locally with the configured
//! embedding provider and sent as `query_embeddings`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::chunk::{RetrievedChunk, UNKNOWN_SOURCE};

use super::embedding::EmbeddingProvider;
use super::retry::check_status;
use super::vector_store::VectorStoreProvider;

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: [&'a str; 3],
}

/// Column-oriented query result, one outer entry per query embedding
#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
}

/// Vector store backed by a Chroma collection
pub struct ChromaVectorStore {
    client: Client,
    base_url: String,
    collection_id: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl ChromaVectorStore {
    /// Connect to the server and resolve the configured collection
    ///
    /// Fails when the server is unreachable or the collection does not exist.
    pub async fn connect(
        config: &VectorDbConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        let base_url = config.url.trim_end_matches('/').to_string();

        let url = format!("{}/api/v1/collections/{}", base_url, config.collection);
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Chroma unreachable at {}: {}", base_url, e)))?;
        let response = check_status(response, Error::VectorDb).await.map_err(|e| {
            Error::vector_db(format!("Collection '{}' unavailable: {}", config.collection, e))
        })?;
        let info: CollectionInfo = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Invalid collection response: {}", e)))?;

        tracing::debug!("Resolved collection '{}' -> {}", config.collection, info.id);

        Ok(Self {
            client,
            base_url,
            collection_id: info.id,
            embedder,
        })
    }
}

#[async_trait]
impl VectorStoreProvider for ChromaVectorStore {
    async fn similarity_search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let embedding = self.embedder.embed(query).await?;

        let url = format!(
            "{}/api/v1/collections/{}/query",
            self.base_url, self.collection_id
        );
        let request = QueryRequest {
            query_embeddings: vec![embedding],
            n_results: top_k,
            include: ["documents", "metadatas", "distances"],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Query request failed: {}", e)))?;
        let response = check_status(response, Error::VectorDb).await?;
        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse query response: {}", e)))?;

        let chunks = into_chunks(body);
        tracing::debug!("Chroma returned {} chunks (top_k {})", chunks.len(), top_k);
        Ok(chunks)
    }

    async fn len(&self) -> Result<usize> {
        let url = format!(
            "{}/api/v1/collections/{}/count",
            self.base_url, self.collection_id
        );
        let response = self.client.get(&url).send().await?;
        let response = check_status(response, Error::VectorDb).await?;
        Ok(response.json::<usize>().await?)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/v1/heartbeat", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "chroma"
    }
}

/// Zip the first query's documents and metadatas into chunks
///
/// Entries without document text are skipped.
fn into_chunks(response: QueryResponse) -> Vec<RetrievedChunk> {
    let documents = response
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();
    let mut metadatas = response
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default()
        .into_iter();

    documents
        .into_iter()
        .filter_map(|document| {
            let metadata = metadatas.next().flatten().unwrap_or_default();
            let content = document?;
            Some(RetrievedChunk {
                content,
                source: metadata
                    .get("source")
                    .and_then(Value::as_str)
                    .unwrap_or(UNKNOWN_SOURCE)
                    .to_string(),
                page: metadata.get("page").and_then(page_number),
            })
        })
        .collect()
}

/// Page metadata may be stored as an integer or a numeric string
fn page_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|p| u32::try_from(p).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
