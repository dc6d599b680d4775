//! mia-rag: cached, citation-aware question answering for the Mia medical assistant
//!
//! Questions are answered from document chunks retrieved out of a vector store
//! and a chat-completion API. Answers are kept in a bounded FIFO cache keyed by
//! question and language, and served over HTTP or from the command line.

pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod types;

pub use cache::{CacheKey, CacheStats, ResponseCache};
pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::QueryPipeline;
pub use types::{CachedResponse, QueryRequest, SearchRequest, SearchResponse, Source};
