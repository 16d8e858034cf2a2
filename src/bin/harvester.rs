// src/bin/harvester.rs

//! # Harvester Binary
//!
//! Bulk-downloads movie details for a known list of identifiers:
//!
//! 1.  **Reading Identifiers**: loads a JSON array of `{ "id": <integer> }` objects.
//! 2.  **Fetching**: a fixed pool of workers requests each movie from the API,
//!     all sharing one global rate limiter.
//! 3.  **Normalizing**: each response body is mapped onto a fixed schema.
//! 4.  **Writing Output**: normalized movies are written in batches, one JSON file
//!     per batch, flushed on batch size or after a quiet period.
//!
//! Startup problems (missing credential, unreadable identifier file, invalid
//! settings) exit non-zero before any request is made. Per-movie failures are
//! logged and do not affect the exit status.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use indicatif::HumanDuration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use movie_harvester::config::{Args, HarvestConfig};
use movie_harvester::data_model::HarvestSummary;
use movie_harvester::driver::run_harvest;
use movie_harvester::error::Result;
use movie_harvester::pipeline::readers::{BaseReader, JsonIdReader};
use movie_harvester::pipeline::writers::JsonBatchWriter;
use movie_harvester::pipeline::{RecordFetcher, TmdbFetcher};
use movie_harvester::utils::common::{
    create_progress_bar, init_tracing, setup_prometheus_metrics, watch_interrupts,
};

#[tokio::main]
async fn main() -> ExitCode {
    // .env first so clap's `env` fallbacks can see it.
    let dotenv_result = dotenv::dotenv();

    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref());
    if let Err(e) = dotenv_result {
        info!("No .env file loaded: {}", e);
    }

    let metrics_port = args.metrics_port;
    let validate_only = args.validate_config;

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if validate_only {
        if let Err(e) = config.check_runnable() {
            error!("Invalid configuration: {}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
        info!(?config, "Configuration is valid.");
        return ExitCode::SUCCESS;
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, interrupt).await {
            std::process::exit(130);
        }
    });

    match run(config, metrics_port, cancel.clone()).await {
        Ok(summary) if cancel.is_cancelled() => {
            log_summary(&summary);
            warn!("Harvest interrupted before all identifiers were processed.");
            ExitCode::FAILURE
        }
        Ok(summary) => {
            log_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Harvest failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    config: HarvestConfig,
    metrics_port: Option<u16>,
    cancel: CancellationToken,
) -> Result<HarvestSummary> {
    let started = Instant::now();
    config.check_runnable()?;
    let api_token = config.api_token()?;

    let ids = JsonIdReader::new(&config.ids_file).read_ids()?;
    let fetcher: Arc<dyn RecordFetcher> = Arc::new(TmdbFetcher::new(
        &config.base_url,
        api_token,
        &config.language,
        config.request_timeout(),
    )?);
    let writer = JsonBatchWriter::new(&config.output_dir, &config.file_prefix)?;

    if let Err(e) = setup_prometheus_metrics(metrics_port).await {
        error!("Failed to start Prometheus metrics endpoint: {}", e);
    }

    info!("Harvester started.");
    info!("Identifier file: {}", config.ids_file.display());
    info!("Output directory: {}", config.output_dir.display());

    let progress_template =
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec}, ETA: {eta}) {msg}";
    let progress = create_progress_bar(ids.len() as u64, "starting", progress_template);

    let summary = run_harvest(&config, ids, fetcher, writer, cancel, progress.clone()).await?;
    progress.finish_with_message(format!("done in {}", HumanDuration(started.elapsed())));
    Ok(summary)
}

fn log_summary(summary: &HarvestSummary) {
    info!("--------------------");
    info!("Harvest Summary:");
    info!("  Identifiers Enqueued: {}", summary.ids_enqueued);
    info!("  Identifiers Skipped (interrupt): {}", summary.ids_skipped);
    info!("  Movies Normalized: {}", summary.workers.normalized);
    info!("    - Fetch Failures: {}", summary.workers.fetch_failed);
    info!("    - Normalize Failures: {}", summary.workers.normalize_failed);
    info!("    - Cancelled Waits: {}", summary.workers.cancelled);
    info!("  Movies Written: {}", summary.aggregator.records_written);
    info!("  Batches Written: {}", summary.aggregator.batches_flushed);
    info!(
        "  Batches Dropped: {} ({} movies)",
        summary.aggregator.batches_failed, summary.aggregator.records_dropped
    );
    info!("--------------------");
}
