//! Query response caching
//!
//! Answers are cached by a digest of (question, language) in a bounded,
//! insertion-ordered map shared by all requests.

pub mod key;
pub mod response_cache;

pub use key::CacheKey;
pub use response_cache::{CacheStats, ResponseCache};
