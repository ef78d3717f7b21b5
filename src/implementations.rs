use crate::embedding_service::EmbeddingClient;
use crate::llm_config::{AnalysisConfig, EmbeddingConfig};
use crate::llm_service::{AnalysisOutcome, LLMServiceClient};
use crate::ticket_loader::{load_tickets_csv, Ticket};
use crate::traits::{EmbeddingProvider, GroupAnalyzer, TicketSource};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

pub struct HttpEmbeddingProvider {
    client: EmbeddingClient,
    name: String,
}

impl HttpEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(config)?;
        let name = client.provider_name();
        Ok(Self { client, name })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client.embed_texts(texts).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct LLMGroupAnalyzer {
    client: LLMServiceClient,
    name: String,
}

impl LLMGroupAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let name = config
            .providers
            .iter()
            .map(|p| format!("{}/{}", p.provider, p.model))
            .collect::<Vec<_>>()
            .join(" → ");
        Ok(Self {
            client: LLMServiceClient::new(config)?,
            name,
        })
    }
}

#[async_trait]
impl GroupAnalyzer for LLMGroupAnalyzer {
    async fn analyse_group(&self, descriptions: &[String]) -> Result<AnalysisOutcome> {
        self.client.analyse_group(descriptions).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Tickets from a CSV export of the service-desk spreadsheet
pub struct CsvTicketSource {
    path: PathBuf,
    name: String,
}

impl CsvTicketSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("tickets")
            .to_string();
        Self { path, name }
    }
}

impl TicketSource for CsvTicketSource {
    fn load_tickets(&self) -> Result<Vec<Ticket>> {
        load_tickets_csv(&self.path)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
