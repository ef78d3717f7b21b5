//! Stand-ins for the external services, shared by the integration tests
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use ticket_analyzer::llm_service::{AnalysisOutcome, GroupAnalysis};
use ticket_analyzer::ticket_loader::Ticket;
use ticket_analyzer::traits::{EmbeddingProvider, GroupAnalyzer};

const KEYWORDS: &[&str] = &["mfa", "sync", "printer"];

/// Embeds text as keyword counts, so texts about the same topic point the
/// same way
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector: Vec<f32> = KEYWORDS
                    .iter()
                    .map(|k| text.matches(k).count() as f32)
                    .collect();
                vector.push(0.1);
                vector
            })
            .collect())
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Returns one vector too few
pub struct ShortEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0, 0.0]; texts.len().saturating_sub(1)])
    }

    fn name(&self) -> &str {
        "short"
    }
}

/// Labels each group with its first description and remembers what it saw
#[derive(Default)]
pub struct RecordingAnalyzer {
    pub calls: AtomicUsize,
    pub batch_sizes: Mutex<Vec<usize>>,
}

#[async_trait]
impl GroupAnalyzer for RecordingAnalyzer {
    async fn analyse_group(&self, descriptions: &[String]) -> Result<AnalysisOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(descriptions.len());

        Ok(AnalysisOutcome::Parsed(GroupAnalysis {
            group_label: descriptions.first().cloned().unwrap_or_default(),
            summary: format!("{} related tickets", descriptions.len()),
            ..Default::default()
        }))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub struct FailingAnalyzer;

#[async_trait]
impl GroupAnalyzer for FailingAnalyzer {
    async fn analyse_group(&self, _descriptions: &[String]) -> Result<AnalysisOutcome> {
        anyhow::bail!("connection refused")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Two MFA tickets, two directory sync tickets and one printer ticket
pub fn sample_tickets() -> Vec<Ticket> {
    [
        ("INC1", "MFA push not received for user on mfa-gateway-01"),
        ("INC2", "Directory sync delay on dir-sync-01"),
        ("INC3", "MFA prompt times out"),
        ("INC4", "Printer jam on floor 3"),
        ("INC5", "Directory sync stalled again"),
    ]
    .iter()
    .map(|(id, description)| {
        Ticket::from_fields(&row(&[
            ("Incident ID", id),
            ("Short Description", description),
            ("Priority", "2"),
        ]))
    })
    .collect()
}
