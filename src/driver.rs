// src/driver.rs

//! Wires the harvest together and owns shutdown ordering:
//!
//! 1. start the aggregator and the worker pool,
//! 2. enqueue every identifier, then close the work queue,
//! 3. join all workers, then close the result channel,
//! 4. wait (bounded) for the aggregator's final flush.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use indicatif::ProgressBar;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::aggregator_logic::Aggregator;
use crate::config::HarvestConfig;
use crate::data_model::{AggregatorStats, HarvestSummary, MovieId, WorkerReport};
use crate::error::{PipelineError, Result};
use crate::pipeline::writers::BaseWriter;
use crate::pipeline::{RateLimiter, RecordFetcher};
use crate::utils::prometheus_metrics::IDS_ENQUEUED_TOTAL;
use crate::worker_logic::{spawn_worker_pool, WorkQueue, WorkerContext};

const PROGRESS_REFRESH: Duration = Duration::from_secs(1);

pub async fn run_harvest<W>(
    config: &HarvestConfig,
    ids: Vec<MovieId>,
    fetcher: Arc<dyn RecordFetcher>,
    writer: W,
    cancel: CancellationToken,
    progress: ProgressBar,
) -> Result<HarvestSummary>
where
    W: BaseWriter + Send + 'static,
{
    config.validate()?;
    let limiter = Arc::new(RateLimiter::new(config.requests_per_second, config.burst)?);

    let (work_tx, work_rx) = mpsc::channel::<MovieId>(config.work_queue_capacity);
    let queue: WorkQueue = Arc::new(Mutex::new(work_rx));
    let (result_tx, result_rx) = mpsc::channel(config.result_channel_capacity);

    let aggregator = Aggregator::new(writer, config.batch_size, config.flush_timeout());
    let stats = aggregator.stats_handle();
    let mut aggregator_handle =
        tokio::spawn(aggregator.run(result_rx).instrument(info_span!("aggregator")));
    let reporter_handle = tokio::spawn(report_progress(Arc::clone(&stats), progress.clone()));

    let ctx = WorkerContext {
        limiter,
        fetcher,
        cancel: cancel.clone(),
        progress,
    };
    let workers = spawn_worker_pool(config.workers, &ctx, &queue, &result_tx);
    drop(queue);
    info!(
        workers = config.workers,
        requests_per_second = config.requests_per_second,
        burst = config.burst,
        batch_size = config.batch_size,
        "Harvest started"
    );

    let total = ids.len() as u64;
    let mut enqueued = 0u64;
    for id in ids {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = work_tx.send(id) => {
                if sent.is_err() {
                    error!(movie_id = id, "Work queue closed before all identifiers were enqueued");
                    break;
                }
                enqueued += 1;
                IDS_ENQUEUED_TOTAL.inc();
            }
        }
    }
    let skipped = total - enqueued;
    if skipped > 0 {
        warn!(skipped, "Stopped enqueuing identifiers after cancellation");
    }
    drop(work_tx);
    info!(enqueued, "All identifiers enqueued; work queue closed");

    let mut report = WorkerReport::default();
    for joined in join_all(workers).await {
        match joined {
            Ok(worker_report) => report.merge(&worker_report),
            Err(e) => error!(error = %e, "Worker task failed"),
        }
    }
    drop(result_tx);
    info!(?report, "All workers finished; result channel closed");

    let shutdown_timeout = config.shutdown_timeout();
    let aggregator_stats = match timeout(shutdown_timeout, &mut aggregator_handle).await {
        Ok(joined) => joined?,
        Err(_) => {
            aggregator_handle.abort();
            reporter_handle.abort();
            error!(
                timeout_secs = shutdown_timeout.as_secs(),
                "Aggregator did not finish its final flush in time"
            );
            return Err(PipelineError::ShutdownTimeout {
                secs: shutdown_timeout.as_secs(),
            });
        }
    };
    reporter_handle.abort();

    Ok(HarvestSummary {
        ids_enqueued: enqueued,
        ids_skipped: skipped,
        workers: report,
        aggregator: aggregator_stats,
    })
}

async fn report_progress(stats: Arc<RwLock<AggregatorStats>>, progress: ProgressBar) {
    let mut ticker = tokio::time::interval(PROGRESS_REFRESH);
    loop {
        ticker.tick().await;
        let snapshot = *stats.read().await;
        progress.set_message(format!(
            "written {} in {} batches ({} buffered)",
            snapshot.records_written,
            snapshot.batches_flushed,
            snapshot
                .records_received
                .saturating_sub(snapshot.records_written + snapshot.records_dropped)
        ));
    }
}
