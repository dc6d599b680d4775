//! Collaborator abstractions for embeddings, vector search and chat completion
//!
//! The traits keep the query pipeline independent of the concrete services
//! (Ollama, Chroma, OpenAI) and let tests substitute in-process fakes.

pub mod chroma;
pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod retry;
pub mod vector_store;

pub use chroma::ChromaVectorStore;
pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiClient;
pub use vector_store::VectorStoreProvider;
