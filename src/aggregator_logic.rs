// src/aggregator_logic.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::{sleep, Instant};
use tracing::{error, info, trace};

use crate::data_model::{AggregatorStats, NormalizedMovie};
use crate::pipeline::writers::BaseWriter;
use crate::utils::prometheus_metrics::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Idle,
    Flushing,
    Draining,
}

/// Why a flush happened; only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Size,
    Timeout,
    Shutdown,
}

/// Single consumer of normalized records. Owns the batch and the writer, so
/// only one flush can ever be in progress.
pub struct Aggregator<W: BaseWriter> {
    writer: W,
    batch: Vec<NormalizedMovie>,
    batch_size: usize,
    flush_timeout: Duration,
    state: AggregatorState,
    stats: Arc<RwLock<AggregatorStats>>,
}

impl<W: BaseWriter> Aggregator<W> {
    pub fn new(writer: W, batch_size: usize, flush_timeout: Duration) -> Self {
        Aggregator {
            writer,
            batch: Vec::with_capacity(batch_size),
            batch_size: batch_size.max(1),
            flush_timeout,
            state: AggregatorState::Idle,
            stats: Arc::new(RwLock::new(AggregatorStats::default())),
        }
    }

    /// Shared view of the running totals for reporters.
    pub fn stats_handle(&self) -> Arc<RwLock<AggregatorStats>> {
        Arc::clone(&self.stats)
    }

    /// Consumes records until every sender is dropped, then writes whatever is
    /// left as one final batch.
    ///
    /// A batch is flushed when it reaches `batch_size`, or when `flush_timeout`
    /// passes without any flush. Both flush paths restart the timeout window;
    /// a timeout with an empty batch only restarts it.
    pub async fn run(mut self, mut results: mpsc::Receiver<NormalizedMovie>) -> AggregatorStats {
        let timer = sleep(self.flush_timeout);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                received = results.recv() => match received {
                    Some(movie) => {
                        self.batch.push(movie);
                        self.stats.write().await.records_received += 1;
                        if self.batch.len() >= self.batch_size {
                            self.flush(FlushTrigger::Size).await;
                            timer.as_mut().reset(Instant::now() + self.flush_timeout);
                        }
                    }
                    None => break,
                },
                () = &mut timer => {
                    if self.batch.is_empty() {
                        trace!("Flush timeout elapsed with an empty batch");
                    } else {
                        self.flush(FlushTrigger::Timeout).await;
                    }
                    timer.as_mut().reset(Instant::now() + self.flush_timeout);
                }
            }
        }

        self.state = AggregatorState::Draining;
        info!(remaining = self.batch.len(), "Result channel closed; draining aggregator");
        if !self.batch.is_empty() {
            self.flush(FlushTrigger::Shutdown).await;
        }

        let Aggregator { writer, stats, .. } = self;
        if let Err(e) = writer.close() {
            error!(error = %e, "Failed to close batch writer");
        }
        let final_stats = *stats.read().await;
        info!(?final_stats, "Aggregator finished");
        final_stats
    }

    /// Writes the current batch and resets it. A failed write drops the batch.
    async fn flush(&mut self, trigger: FlushTrigger) {
        let resume = match self.state {
            AggregatorState::Draining => AggregatorState::Draining,
            _ => AggregatorState::Idle,
        };
        self.state = AggregatorState::Flushing;
        let batch = std::mem::replace(&mut self.batch, Vec::with_capacity(self.batch_size));
        let size = batch.len() as u64;
        info!(?trigger, size, "Writing batch");

        let timer = FLUSH_DURATION_SECONDS.start_timer();
        let result = self.writer.write_batch(&batch);
        timer.observe_duration();

        let mut stats = self.stats.write().await;
        match result {
            Ok(()) => {
                stats.records_written += size;
                stats.batches_flushed += 1;
                RECORDS_WRITTEN_TOTAL.inc_by(size as f64);
                BATCHES_FLUSHED_TOTAL.inc();
            }
            Err(e) => {
                stats.records_dropped += size;
                stats.batches_failed += 1;
                BATCH_WRITE_ERRORS_TOTAL.inc();
                error!(?trigger, size, error = %e, "Batch write failed; batch dropped");
            }
        }
        drop(stats);

        trace!(state = ?resume, "Flush complete");
        self.state = resume;
    }
}
