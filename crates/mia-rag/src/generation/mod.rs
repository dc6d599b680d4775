//! Prompt context assembly and message construction

pub mod context;
pub mod prompt;

pub use context::{AssembledContext, ContextAssembler, CONTEXT_DELIMITER};
pub use prompt::{AnswerLanguage, PromptBuilder};
