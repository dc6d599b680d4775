//! Core types for the RAG service

pub mod chunk;
pub mod message;
pub mod query;
pub mod response;

pub use chunk::{RetrievedChunk, Source};
pub use message::{ChatMessage, Role};
pub use query::{QueryRequest, SearchRequest, DEFAULT_LANGUAGE};
pub use response::{CachedResponse, SearchHit, SearchResponse};
