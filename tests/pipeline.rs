/// End-to-end pipeline runs against stand-in services
mod common;

use common::{sample_tickets, FailingAnalyzer, KeywordEmbedder, RecordingAnalyzer, ShortEmbedder};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use ticket_analyzer::llm_service::AnalysisOutcome;
use ticket_analyzer::pipeline::{load_report, save_report, TicketPipeline};
use ticket_analyzer::GroupingConfig;

fn pipeline_with(analyzer: Arc<RecordingAnalyzer>) -> TicketPipeline {
    TicketPipeline::new(Arc::new(KeywordEmbedder), analyzer, GroupingConfig::default())
}

#[tokio::test]
async fn test_group_tickets_full_partition() {
    let pipeline = pipeline_with(Arc::new(RecordingAnalyzer::default()));
    let tickets = sample_tickets();

    let groups = pipeline
        .group_tickets(&tickets, pipeline.config())
        .await
        .unwrap();

    assert_eq!(groups, vec![vec![0, 2], vec![1, 4], vec![3]]);
}

#[tokio::test]
async fn test_run_analyses_meaningful_groups() {
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let pipeline = pipeline_with(analyzer.clone());
    let tickets = sample_tickets();

    let report = pipeline.run(&tickets).await.unwrap();

    println!("Report: {} tickets, {} groups total", report.total_tickets, report.total_groups);
    for group in &report.groups {
        println!("  Group {}: {:?}", group.group_number, group.ticket_indices);
    }

    assert_eq!(report.total_tickets, 5);
    assert_eq!(report.total_groups, 3);
    assert_eq!(report.groups.len(), 2);
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 2);

    let first = &report.groups[0];
    assert_eq!(first.group_number, 1);
    assert_eq!(first.ticket_indices, vec![0, 2]);
    assert!(first.tickets[0].display_text.contains("Ticket ID: INC1"));
    assert_eq!(first.tickets[1].embedding_text, "mfa prompt times out");

    let analysis = first.analysis.as_ref().and_then(|a| a.analysis()).unwrap();
    assert_eq!(analysis.group_label, "mfa push not received for user on mfa-gateway-01");

    assert_eq!(report.groups[1].group_number, 2);
    assert_eq!(report.groups[1].ticket_indices, vec![1, 4]);
}

#[tokio::test]
async fn test_description_cap() {
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let pipeline = pipeline_with(analyzer.clone());
    let config = GroupingConfig::default().with_max_descriptions(1);

    pipeline.run_with_config(&sample_tickets(), &config).await.unwrap();

    let sizes = analyzer.batch_sizes.lock().unwrap().clone();
    assert_eq!(sizes, vec![1, 1]);
}

#[tokio::test]
async fn test_min_group_size_filter() {
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let pipeline = pipeline_with(analyzer.clone());

    let config = GroupingConfig::default().with_min_group_size(1);
    let report = pipeline.run_with_config(&sample_tickets(), &config).await.unwrap();
    assert_eq!(report.groups.len(), 3);

    let config = GroupingConfig::default().with_min_group_size(3);
    let report = pipeline.run_with_config(&sample_tickets(), &config).await.unwrap();
    assert!(report.groups.is_empty());
    assert_eq!(report.total_groups, 3);
}

#[tokio::test]
async fn test_analysis_failure_is_not_fatal() {
    let pipeline = TicketPipeline::new(
        Arc::new(KeywordEmbedder),
        Arc::new(FailingAnalyzer),
        GroupingConfig::default(),
    );

    let report = pipeline.run(&sample_tickets()).await.unwrap();
    assert_eq!(report.groups.len(), 2);

    for group in &report.groups {
        match group.analysis.as_ref().unwrap() {
            AnalysisOutcome::Unparsed { raw_response, .. } => {
                assert!(raw_response.contains("connection refused"));
            }
            other => panic!("expected unparsed outcome, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_embedding_count_mismatch() {
    let pipeline = TicketPipeline::new(
        Arc::new(ShortEmbedder),
        Arc::new(RecordingAnalyzer::default()),
        GroupingConfig::default(),
    );

    let err = pipeline.run(&sample_tickets()).await.unwrap_err();
    assert!(err.to_string().contains("4 vectors for 5 tickets"));
}

#[tokio::test]
async fn test_empty_batch_is_invalid_input() {
    let pipeline = pipeline_with(Arc::new(RecordingAnalyzer::default()));

    let err = pipeline.run(&[]).await.unwrap_err();
    assert!(err.downcast_ref::<ticket_analyzer::GroupingError>().is_some());
}

#[tokio::test]
async fn test_report_round_trip_and_offline_run() {
    let pipeline = pipeline_with(Arc::new(RecordingAnalyzer::default()));
    let tickets = sample_tickets();

    let mut saved = pipeline.run(&tickets).await.unwrap();
    // Keep only the first group's analysis
    saved.groups.truncate(1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offline").join("offline_results.json");
    save_report(&saved, &path).unwrap();
    let loaded = load_report(&path).unwrap();
    assert_eq!(loaded, saved);

    let report = pipeline
        .run_offline(&tickets, pipeline.config(), &loaded)
        .await
        .unwrap();

    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.groups[0].analysis, saved.groups[0].analysis);
    assert!(report.groups[1].analysis.is_none());
}

#[test]
fn test_load_missing_report() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_report(dir.path().join("does_not_exist.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read report"));
}

#[tokio::test]
async fn test_run_on_spawned_task() {
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let pipeline = Arc::new(pipeline_with(analyzer.clone()).with_concurrency(2));
    let tickets = sample_tickets();

    let handle = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run(&tickets).await }
    });

    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.groups.len(), 2);
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 2);
}
