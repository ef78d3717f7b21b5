/// Dependency injection traits for the external services
///
/// The pipeline only talks to these traits, so the embedding provider, the
/// analysis service and the ticket source can be swapped for testing or for
/// a different vendor.
use crate::llm_service::AnalysisOutcome;
use crate::ticket_loader::Ticket;
use anyhow::Result;
use async_trait::async_trait;

// ============================================================================
// Embedding Trait
// ============================================================================

/// Turns ticket text into fixed-length vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed all texts; the result has one vector per input, in input order,
    /// all of the same length
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the name/identifier of this provider (for reporting)
    fn name(&self) -> &str;
}

// ============================================================================
// Group Analysis Trait
// ============================================================================

/// Summarises a group of related ticket descriptions
#[async_trait]
pub trait GroupAnalyzer: Send + Sync {
    /// Analyse one group
    ///
    /// An `Err` means the service could not be reached at all; a reply that
    /// could not be understood comes back as `AnalysisOutcome::Unparsed`.
    async fn analyse_group(&self, descriptions: &[String]) -> Result<AnalysisOutcome>;

    fn name(&self) -> &str;
}

// ============================================================================
// Ticket Source Trait
// ============================================================================

/// Where a batch of tickets comes from
pub trait TicketSource: Send + Sync {
    fn load_tickets(&self) -> Result<Vec<Ticket>>;

    fn name(&self) -> &str;
}
