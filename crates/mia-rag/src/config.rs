//! Configuration for the RAG service
//!
//! Values are resolved in three layers: built-in defaults, an optional TOML
//! file, then environment variables (the deployment knobs of the hosted
//! service: `OPENAI_API_KEY`, `MODEL`, `PORT`, `DEBUG`, ...).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Response cache configuration
    pub cache: CacheConfig,
    /// Query defaults and bounds
    pub query: QueryConfig,
    /// Chat-completion (OpenAI) configuration
    pub llm: LlmConfig,
    /// Embedding (Ollama) configuration
    pub embeddings: EmbeddingConfig,
    /// Vector database (Chroma) configuration
    pub vector_db: VectorDbConfig,
    /// Per-client rate limits
    pub rate_limit: RateLimitConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Verbose logging
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            debug: false,
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached answers (FIFO eviction beyond this)
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

/// Query defaults and bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Chunks retrieved when the caller does not say
    pub default_top_k: usize,
    /// Upper bound on chunks retrieved per request
    pub max_top_k: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 50,
        }
    }
}

/// Chat-completion API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key (bearer token)
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token limit
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

// Hand-written so the API key never reaches the logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Model used at ingestion time (queries must use the same one)
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Chroma server URL
    pub url: String,
    /// Collection holding the document chunks
    pub collection: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            collection: "vector_db".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Per-client rate limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Requests per hour for routes without a dedicated limit
    pub default_per_hour: u32,
    /// Requests per minute on `/query`
    pub query_per_minute: u32,
    /// Requests per minute on `/search`
    pub search_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_per_hour: 100,
            query_per_minute: 30,
            search_per_minute: 60,
        }
    }
}

impl RagConfig {
    /// Load configuration: defaults, then the TOML file (if any), then environment
    ///
    /// Without an explicit path, `MIA_CONFIG` and then
    /// `~/.config/mia-rag/config.toml` are tried; a missing default file is fine.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("MIA_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file '{}': {}", path.display(), e))
        })
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mia-rag").join("config.toml"))
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("MODEL") {
            self.llm.model = model;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid PORT: {}", port)))?;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.server.debug = debug.eq_ignore_ascii_case("true");
        }
        if let Some(url) = lookup("DB_URL") {
            self.vector_db.url = url.trim_end_matches('/').to_string();
        }
        if let Some(collection) = lookup("DB_COLLECTION") {
            self.vector_db.collection = collection;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.embeddings.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("EMBED_MODEL") {
            self.embeddings.model = model;
        }
        if let Some(size) = lookup("MAX_CACHE_SIZE") {
            self.cache.max_entries = size
                .parse()
                .map_err(|_| Error::Config(format!("Invalid MAX_CACHE_SIZE: {}", size)))?;
        }
        Ok(())
    }

    /// Default tracing filter for the binaries
    pub fn log_filter(&self) -> &'static str {
        if self.server.debug {
            "mia_rag=debug,tower_http=debug"
        } else {
            "mia_rag=info,tower_http=info"
        }
    }

    /// Listen address as `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
