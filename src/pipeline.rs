/// End-to-end ticket analysis
///
/// tickets → embeddings + entity tags → groups → size filter → per-group
/// analysis → report. The grouping step is the pure engine; everything around
/// it goes through the `EmbeddingProvider` and `GroupAnalyzer` traits.
use crate::entity_extractor::extract_all;
use crate::group_builder::Group;
use crate::grouping::{group_items, meaningful_groups, Item};
use crate::grouping_config::GroupingConfig;
use crate::llm_service::AnalysisOutcome;
use crate::ticket_loader::Ticket;
use crate::traits::{EmbeddingProvider, GroupAnalyzer};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_ANALYSIS_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSummary {
    pub display_text: String,
    pub embedding_text: String,
}

impl From<&Ticket> for TicketSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            display_text: ticket.display_text.clone(),
            embedding_text: ticket.embedding_text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    /// 1-based position among the groups that survived the size filter
    pub group_number: usize,
    pub ticket_indices: Vec<usize>,
    pub tickets: Vec<TicketSummary>,
    pub analysis: Option<AnalysisOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub total_tickets: usize,
    /// Groups in the full partition, before the size filter
    pub total_groups: usize,
    pub groups: Vec<GroupReport>,
}

impl AnalysisReport {
    pub fn find_group(&self, group_number: usize) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.group_number == group_number)
    }
}

/// Write a report as pretty JSON, creating parent directories
pub fn save_report(report: &AnalysisReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

pub fn load_report(path: impl AsRef<Path>) -> Result<AnalysisReport> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report: {}", path.display()))
}

pub struct TicketPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    analyzer: Arc<dyn GroupAnalyzer>,
    config: GroupingConfig,
    concurrency: usize,
}

impl TicketPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        analyzer: Arc<dyn GroupAnalyzer>,
        config: GroupingConfig,
    ) -> Self {
        Self {
            embedder,
            analyzer,
            config,
            concurrency: DEFAULT_ANALYSIS_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Embed and group tickets; returns the complete partition
    pub async fn group_tickets(&self, tickets: &[Ticket], config: &GroupingConfig) -> Result<Vec<Group>> {
        let texts: Vec<String> = tickets.iter().map(|t| t.embedding_text.clone()).collect();

        info!("🧮 Generating embeddings for {} tickets with {}", texts.len(), self.embedder.name());
        let embeddings = self
            .embedder
            .embed_texts(&texts)
            .await
            .context("Failed to generate embeddings")?;

        if embeddings.len() != tickets.len() {
            anyhow::bail!(
                "Embedding provider returned {} vectors for {} tickets",
                embeddings.len(),
                tickets.len()
            );
        }

        let tags = extract_all(&texts);
        let items: Vec<Item> = embeddings
            .into_iter()
            .zip(tags)
            .enumerate()
            .map(|(index, (embedding, entity_tags))| Item::new(index, embedding, entity_tags))
            .collect();

        let groups = group_items(&items, config)?;
        info!(
            "🔗 Grouped {} tickets into {} groups (max_distance={}, asset_boost={})",
            tickets.len(),
            groups.len(),
            config.max_distance,
            config.asset_boost
        );

        Ok(groups)
    }

    /// Full online run with the pipeline's own configuration
    pub async fn run(&self, tickets: &[Ticket]) -> Result<AnalysisReport> {
        self.run_with_config(tickets, &self.config).await
    }

    /// Full online run: every surviving group is sent to the analysis service
    pub async fn run_with_config(&self, tickets: &[Ticket], config: &GroupingConfig) -> Result<AnalysisReport> {
        let groups = self.group_tickets(tickets, config).await?;
        let total_groups = groups.len();
        let selected = meaningful_groups(groups, config.min_group_size);
        info!("📌 {} meaningful groups (min size {})", selected.len(), config.min_group_size);

        let cap = config.max_descriptions_per_group;
        let total = selected.len();
        let batches: Vec<Vec<String>> = selected
            .iter()
            .map(|group| {
                group
                    .iter()
                    .take(cap)
                    .map(|&i| tickets[i].embedding_text.clone())
                    .collect()
            })
            .collect();

        let analyzer = &self.analyzer;
        let analyses: Vec<AnalysisOutcome> = stream::iter(batches.into_iter().enumerate())
            .map(|(idx, descriptions)| {
                let analyzer = Arc::clone(analyzer);
                async move {
                    debug!("Analysing group {}/{}", idx + 1, total);
                    match analyzer.analyse_group(&descriptions).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            warn!("Analysis of group {} failed: {}", idx + 1, e);
                            AnalysisOutcome::unparsed("LLM analysis unavailable", e.to_string())
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        info!("✅ Analysis complete for {} groups with {}", total, self.analyzer.name());

        let groups = selected
            .into_iter()
            .zip(analyses)
            .enumerate()
            .map(|(idx, (group, analysis))| build_group_report(idx + 1, group, tickets, Some(analysis)))
            .collect();

        Ok(AnalysisReport {
            generated_at: Utc::now(),
            total_tickets: tickets.len(),
            total_groups,
            groups,
        })
    }

    /// Group online but take analyses from a previously saved report
    ///
    /// Groups are matched by number; a group with no saved counterpart gets
    /// no analysis.
    pub async fn run_offline(
        &self,
        tickets: &[Ticket],
        config: &GroupingConfig,
        saved: &AnalysisReport,
    ) -> Result<AnalysisReport> {
        let groups = self.group_tickets(tickets, config).await?;
        let total_groups = groups.len();
        let selected = meaningful_groups(groups, config.min_group_size);

        let groups: Vec<GroupReport> = selected
            .into_iter()
            .enumerate()
            .map(|(idx, group)| {
                let group_number = idx + 1;
                let analysis = saved
                    .find_group(group_number)
                    .and_then(|g| g.analysis.clone());
                if analysis.is_none() {
                    warn!("No saved analysis for group {}", group_number);
                }
                build_group_report(group_number, group, tickets, analysis)
            })
            .collect();

        Ok(AnalysisReport {
            generated_at: Utc::now(),
            total_tickets: tickets.len(),
            total_groups,
            groups,
        })
    }
}

fn build_group_report(
    group_number: usize,
    group: Group,
    tickets: &[Ticket],
    analysis: Option<AnalysisOutcome>,
) -> GroupReport {
    GroupReport {
        group_number,
        tickets: group.iter().map(|&i| TicketSummary::from(&tickets[i])).collect(),
        ticket_indices: group,
        analysis,
    }
}
