//! Mia RAG server binary
//!
//! Run with: cargo run -p mia-rag --bin mia-rag-server

use mia_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RagConfig::load(None)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                  Mia RAG API Server                       ║
║        Medical Intelligence Assistant (cached)            ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    tracing::info!("Configuration loaded");
    tracing::info!("  - Chat model: {}", config.llm.model);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Vector store: {} ({})", config.vector_db.url, config.vector_db.collection);
    tracing::info!("  - Cache size: {}", config.cache.max_entries);
    tracing::info!("  - Debug: {}", config.server.debug);

    if config.llm.api_key.is_none() {
        anyhow::bail!("OPENAI_API_KEY not set");
    }

    let server = RagServer::new(config).await;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /query        - Ask questions");
    println!("  POST /search       - Search documents");
    println!("  POST /cache/clear  - Clear response cache");
    println!("  GET  /cache/stats  - Cache statistics");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
