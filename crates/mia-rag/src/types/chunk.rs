//! Retrieved chunk and source citation types

use serde::{Deserialize, Serialize};

/// Fallback name when the vector store has no source path for a chunk
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// A document chunk returned by the retrieval collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk text
    pub content: String,
    /// Path of the document the chunk came from
    pub source: String,
    /// Page number, when the loader recorded one
    pub page: Option<u32>,
}

impl RetrievedChunk {
    /// Create a chunk without page information
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            page: None,
        }
    }

    /// Attach a page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Final path segment of the source path
    ///
    /// Both `/` and `\` count as separators since ingestion may have run on
    /// either platform.
    pub fn file_name(&self) -> &str {
        let name = self
            .source
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();
        if name.is_empty() {
            UNKNOWN_SOURCE
        } else {
            name
        }
    }
}

/// Source citation returned with an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Base name of the source document
    pub file: String,
    /// Page number (serialized as `null` when absent)
    pub page: Option<u32>,
}

impl From<&RetrievedChunk> for Source {
    fn from(chunk: &RetrievedChunk) -> Self {
        Self {
            file: chunk.file_name().to_string(),
            page: chunk.page,
        }
    }
}
