// src/worker_logic.rs

use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::data_model::{MovieId, NormalizedMovie, WorkerReport};
use crate::error::{PipelineError, Result};
use crate::pipeline::{normalize, RateLimiter, RecordFetcher};
use crate::utils::prometheus_metrics::*;

/// Multi-consumer end of the work queue. Workers take turns holding the lock
/// while waiting for the next identifier.
pub type WorkQueue = Arc<Mutex<mpsc::Receiver<MovieId>>>;

/// Everything a worker shares with its siblings.
#[derive(Clone)]
pub struct WorkerContext {
    pub limiter: Arc<RateLimiter>,
    pub fetcher: Arc<dyn RecordFetcher>,
    pub cancel: CancellationToken,
    pub progress: ProgressBar,
}

/// Rate limit, fetch and normalize a single identifier.
pub async fn execute_fetch_pipeline(id: MovieId, ctx: &WorkerContext) -> Result<NormalizedMovie> {
    ctx.limiter.acquire(&ctx.cancel).await?;
    let raw = ctx.fetcher.fetch(id).await?;
    normalize(&raw)
}

/// Pulls identifiers until the queue is closed and drained. Failures are logged
/// and the identifier is dropped; nothing is retried.
pub async fn run_worker(
    ctx: WorkerContext,
    queue: WorkQueue,
    results: mpsc::Sender<NormalizedMovie>,
) -> WorkerReport {
    let mut report = WorkerReport::default();

    loop {
        let next = { queue.lock().await.recv().await };
        let Some(id) = next else {
            break;
        };
        report.processed += 1;

        match execute_fetch_pipeline(id, &ctx).await {
            Ok(movie) => {
                report.normalized += 1;
                RECORDS_NORMALIZED_TOTAL.inc();
                // Blocks while the aggregator is behind.
                if results.send(movie).await.is_err() {
                    error!(movie_id = id, "Result channel closed; record dropped");
                }
            }
            Err(e) => record_failure(id, &e, &mut report),
        }
        ctx.progress.inc(1);
    }

    debug!(?report, "Worker finished");
    report
}

fn record_failure(id: MovieId, e: &PipelineError, report: &mut WorkerReport) {
    match e {
        PipelineError::RateLimitCancelled => {
            report.cancelled += 1;
            warn!(movie_id = id, "Rate limit wait cancelled; skipping movie");
        }
        PipelineError::NormalizeSchemaError(_) => {
            report.normalize_failed += 1;
            NORMALIZE_ERRORS_TOTAL.inc();
            warn!(movie_id = id, error = %e, "Failed to normalize movie");
        }
        other => {
            report.fetch_failed += 1;
            FETCH_ERRORS_TOTAL.with_label_values(&[other.kind()]).inc();
            warn!(movie_id = id, kind = other.kind(), error = %other, "Failed to fetch movie");
        }
    }
}

/// Starts `count` workers. Each holds its own clone of `results`, so the channel
/// closes only once every worker has exited and the caller drops its sender.
pub fn spawn_worker_pool(
    count: usize,
    ctx: &WorkerContext,
    queue: &WorkQueue,
    results: &mpsc::Sender<NormalizedMovie>,
) -> Vec<JoinHandle<WorkerReport>> {
    (0..count)
        .map(|worker_id| {
            tokio::spawn(
                run_worker(ctx.clone(), Arc::clone(queue), results.clone())
                    .instrument(info_span!("worker", worker_id)),
            )
        })
        .collect()
}
