//! doubt-rag server binary
//!
//! Run with: cargo run -p doubt-rag --bin doubt-rag-server

use doubt_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doubt_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (a missing GEMINI_API_KEY stops here)
    let config = RagConfig::load(None)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config).await?;

    // An unreachable model only marks the server not ready
    let state = server.state();
    if state.check_llm().await {
        tracing::info!("{} is reachable", state.llm_provider().name());
    } else {
        tracing::warn!(
            "{} is not reachable yet; /ready reports 503 and questions will fail until it is",
            state.llm_provider().name()
        );
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/chatbot/askdoubt - Ask a question");
    println!("  POST /api/chatbot/upload   - Upload documents and ask about them");
    println!("  GET  /api/index            - Index statistics");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
