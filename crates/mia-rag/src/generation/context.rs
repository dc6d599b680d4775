//! Context assembly from retrieved chunks

use crate::types::{RetrievedChunk, Source};

/// Separator placed between chunk contents in the prompt context
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Prompt context plus the citations it was built from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    /// Chunk contents joined with [`CONTEXT_DELIMITER`]
    pub context: String,
    /// One source per chunk, in retrieval order
    pub sources: Vec<Source>,
}

/// Turns retrieved chunks into prompt context and source citations
pub struct ContextAssembler;

impl ContextAssembler {
    /// Join chunk contents and collect their sources, keeping retrieval order
    pub fn assemble(chunks: &[RetrievedChunk]) -> AssembledContext {
        let context = chunks
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER);

        let sources = chunks.iter().map(Source::from).collect();

        AssembledContext { context, sources }
    }
}
