mod common;

use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use common::{Canned, FlakyWriter, MemoryWriter, StaticFetcher};
use movie_harvester::config::HarvestConfig;
use movie_harvester::data_model::NormalizedMovie;
use movie_harvester::driver::run_harvest;
use movie_harvester::error::{PipelineError, Result};
use movie_harvester::pipeline::writers::BaseWriter;

fn fast_config() -> HarvestConfig {
    HarvestConfig {
        workers: 8,
        requests_per_second: 10_000.0,
        burst: 10,
        batch_size: 10,
        flush_timeout_secs: 60,
        shutdown_timeout_secs: 5,
        work_queue_capacity: 4,
        result_channel_capacity: 4,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_all_records_written_in_size_batches() {
    let writer = MemoryWriter::default();
    let fetcher = Arc::new(StaticFetcher::default());
    let ids: Vec<u64> = (1..=25).collect();

    let summary = run_harvest(
        &fast_config(),
        ids.clone(),
        fetcher.clone(),
        writer.clone(),
        CancellationToken::new(),
        ProgressBar::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(summary.ids_enqueued, 25);
    assert_eq!(summary.ids_skipped, 0);
    assert_eq!(summary.workers.processed, 25);
    assert_eq!(summary.workers.normalized, 25);
    assert_eq!(summary.aggregator.records_written, 25);
    assert_eq!(summary.aggregator.batches_flushed, 3);

    assert_eq!(writer.batch_sizes(), vec![10, 10, 5]);
    let mut written = writer.all_ids();
    written.sort();
    assert_eq!(written, ids);
    assert!(writer.is_closed());
    assert_eq!(fetcher.calls(), 25);
}

#[tokio::test]
async fn test_duplicate_identifiers_are_fetched_twice() {
    let writer = MemoryWriter::default();
    let fetcher = Arc::new(StaticFetcher::default());

    let summary = run_harvest(
        &fast_config(),
        vec![7, 7, 8],
        fetcher.clone(),
        writer.clone(),
        CancellationToken::new(),
        ProgressBar::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(summary.aggregator.records_written, 3);
    let mut written = writer.all_ids();
    written.sort();
    assert_eq!(written, vec![7, 7, 8]);
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test]
async fn test_failed_identifiers_are_counted_and_skipped() {
    let writer = MemoryWriter::default();
    let fetcher = StaticFetcher::default()
        .with(3, Canned::Status(404))
        .with(5, Canned::Body(json!({ "title": "missing id" })))
        .with(9, Canned::Transport);

    let summary = run_harvest(
        &fast_config(),
        (1..=12).collect(),
        Arc::new(fetcher),
        writer.clone(),
        CancellationToken::new(),
        ProgressBar::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(summary.workers.processed, 12);
    assert_eq!(summary.workers.normalized, 9);
    assert_eq!(summary.workers.fetch_failed, 2);
    assert_eq!(summary.workers.normalize_failed, 1);
    assert_eq!(summary.aggregator.records_written, 9);

    let written = writer.all_ids();
    assert!(!written.contains(&3));
    assert!(!written.contains(&5));
    assert!(!written.contains(&9));
}

#[tokio::test]
async fn test_empty_identifier_list_writes_nothing() {
    let writer = FlakyWriter::default();

    let summary = run_harvest(
        &fast_config(),
        Vec::new(),
        Arc::new(StaticFetcher::default()),
        writer.clone(),
        CancellationToken::new(),
        ProgressBar::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(summary.ids_enqueued, 0);
    assert_eq!(summary.aggregator.batches_flushed, 0);
    assert_eq!(writer.attempts(), 0);
    assert!(writer.inner.is_closed());
}

#[tokio::test]
async fn test_cancelled_before_start_skips_every_identifier() {
    let writer = MemoryWriter::default();
    let fetcher = Arc::new(StaticFetcher::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = run_harvest(
        &fast_config(),
        (1..=50).collect(),
        fetcher.clone(),
        writer.clone(),
        cancel,
        ProgressBar::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(summary.ids_enqueued, 0);
    assert_eq!(summary.ids_skipped, 50);
    assert_eq!(fetcher.calls(), 0);
    assert!(writer.batch_sizes().is_empty());
    assert!(writer.is_closed());
}

#[tokio::test]
async fn test_write_failures_do_not_fail_the_run() {
    let writer = FlakyWriter::always_failing();

    let summary = run_harvest(
        &fast_config(),
        (1..=25).collect(),
        Arc::new(StaticFetcher::default()),
        writer.clone(),
        CancellationToken::new(),
        ProgressBar::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(summary.aggregator.records_received, 25);
    assert_eq!(summary.aggregator.records_written, 0);
    assert_eq!(summary.aggregator.records_dropped, 25);
    assert_eq!(summary.aggregator.batches_failed, 3);
    assert_eq!(writer.attempts(), 3);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_any_fetch() {
    let fetcher = Arc::new(StaticFetcher::default());
    let config = HarvestConfig {
        workers: 0,
        ..fast_config()
    };

    let result = run_harvest(
        &config,
        vec![1, 2, 3],
        fetcher.clone(),
        MemoryWriter::default(),
        CancellationToken::new(),
        ProgressBar::hidden(),
    )
    .await;

    assert!(matches!(
        result,
        Err(PipelineError::ConfigValidationError(_))
    ));
    assert_eq!(fetcher.calls(), 0);
}

/// Blocks the aggregator thread inside every write.
#[derive(Clone)]
struct StallingWriter {
    stall: Duration,
}

impl BaseWriter for StallingWriter {
    fn write_batch(&mut self, _records: &[NormalizedMovie]) -> Result<()> {
        std::thread::sleep(self.stall);
        Ok(())
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stalled_final_flush_hits_shutdown_timeout() {
    let config = HarvestConfig {
        batch_size: 100,
        shutdown_timeout_secs: 1,
        ..fast_config()
    };

    let result = run_harvest(
        &config,
        vec![1, 2, 3],
        Arc::new(StaticFetcher::default()),
        StallingWriter {
            stall: Duration::from_secs(3),
        },
        CancellationToken::new(),
        ProgressBar::hidden(),
    )
    .await;

    match result {
        Err(PipelineError::ShutdownTimeout { secs }) => assert_eq!(secs, 1),
        other => panic!("Expected shutdown timeout, got {:?}", other.map(|_| ())),
    }
}
