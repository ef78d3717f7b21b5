/// Generate offline analysis results
///
/// Loads a ticket CSV, runs the full pipeline (embeddings, grouping, LLM
/// analysis) and saves the report so the API can serve it in offline mode.
///
/// Usage: generate-offline-results <tickets.csv> [output.json]

use anyhow::{Context, Result};
use std::sync::Arc;
use ticket_analyzer::config::Config;
use ticket_analyzer::implementations::{CsvTicketSource, HttpEmbeddingProvider, LLMGroupAnalyzer};
use ticket_analyzer::pipeline::{save_report, TicketPipeline};
use ticket_analyzer::traits::TicketSource;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .context("Usage: generate-offline-results <tickets.csv> [output.json]")?;

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let output = args
        .next()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| config.offline_results_path.clone());

    let source = CsvTicketSource::new(&input);
    let tickets = source.load_tickets()?;
    info!("📝 {} tickets loaded from {}", tickets.len(), source.name());

    let analysis_config = config.analysis_config()?;
    let concurrency = analysis_config.max_concurrent;
    let pipeline = TicketPipeline::new(
        Arc::new(HttpEmbeddingProvider::new(config.embedding_config()?)?),
        Arc::new(LLMGroupAnalyzer::new(analysis_config)?),
        config.grouping.clone(),
    )
    .with_concurrency(concurrency);

    let report = pipeline.run(&tickets).await?;
    info!(
        "📌 {} meaningful groups out of {} total",
        report.groups.len(),
        report.total_groups
    );

    save_report(&report, &output)?;
    info!("💾 Offline results saved to {}", output.display());

    Ok(())
}
