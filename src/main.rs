use std::sync::Arc;
use tracing::info;

use ticket_analyzer::api::{router, AppState};
use ticket_analyzer::config::Config;
use ticket_analyzer::implementations::{HttpEmbeddingProvider, LLMGroupAnalyzer};
use ticket_analyzer::pipeline::TicketPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration from environment variables
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("❌ Configuration error: {}", e);
            tracing::error!("💡 Please set the required environment variables:");
            tracing::error!("   - LLM_PROVIDER: LLM provider (openai, anthropic, ollama; default openai)");
            tracing::error!("   - LLM_API_KEY / OPENAI_API_KEY: API key for the LLM and embedding service");
            tracing::error!("   - LLM_MODEL: Model name (optional, auto-detected from provider)");
            tracing::error!("   - EMBEDDING_PROVIDER / EMBEDDING_MODEL (optional)");
            tracing::error!("   - OLLAMA_ENDPOINT: Ollama server (e.g., http://localhost:11434)");
            tracing::error!("   - MAX_DISTANCE, ASSET_BOOST, MIN_GROUP_SIZE (optional grouping tunables)");
            std::process::exit(1);
        }
    };

    config.log_config();

    let analysis_config = config.analysis_config()?;
    let concurrency = analysis_config.max_concurrent;
    let embedder = Arc::new(HttpEmbeddingProvider::new(config.embedding_config()?)?);
    let analyzer = Arc::new(LLMGroupAnalyzer::new(analysis_config)?);

    let pipeline = TicketPipeline::new(embedder, analyzer, config.grouping.clone())
        .with_concurrency(concurrency);

    let app_state = Arc::new(AppState {
        pipeline,
        offline_results_path: config.offline_results_path.clone(),
    });

    let app = router(app_state);

    info!("🚀 Ticket Analyzer API starting on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
