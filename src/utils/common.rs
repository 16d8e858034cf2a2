// src/utils/common.rs

use std::future::Future;
use std::path::Path;

use axum::{http::StatusCode, routing::get, serve, Router};
use indicatif::{ProgressBar, ProgressStyle};
use prometheus::{gather, Encoder, TextEncoder};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::Result;

/// Installs the global subscriber: human-readable output on stdout, plus a daily
/// rolling JSON file when `log_dir` is given. Keep the returned guard alive
/// for the whole process or buffered file lines are lost.
pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_filter(filter);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "harvester.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            let file_layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(file_filter);
            tracing_subscriber::registry()
                .with(stdout_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(stdout_layer).init();
            None
        }
    }
}

// Axum handler for /metrics
async fn metrics_handler() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&gather(), &mut buffer) {
        error!("Could not encode prometheus metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Could not encode prometheus metrics: {}", e),
        );
    }
    match String::from_utf8(buffer) {
        Ok(s) => (StatusCode::OK, s),
        Err(e) => {
            error!("Prometheus metrics UTF-8 error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Prometheus metrics UTF-8 error: {}", e),
            )
        }
    }
}

/// Serves `/metrics` on `0.0.0.0:<port>` in a background task when a port is set.
pub async fn setup_prometheus_metrics(metrics_port: Option<u16>) -> Result<()> {
    let Some(port) = metrics_port else {
        info!("Prometheus metrics endpoint not configured (no port specified).");
        return Ok(());
    };

    let app = Router::new().route("/metrics", get(metrics_handler));
    let listener_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&listener_addr).await?;
    info!(
        "Metrics endpoint will be available at http://{}/metrics",
        listener_addr
    );

    tokio::spawn(async move {
        if let Err(e) = serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });
    Ok(())
}

/// Progress bar over `total_items`, or a spinner when the total is unknown.
pub fn create_progress_bar(total_items: u64, message: &str, template: &str) -> ProgressBar {
    let pb = if total_items == 0 {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::new(total_items)
    };
    pb.set_message(message.to_string());
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}

/// Turns interrupt signals into shutdown steps. The first signal cancels
/// `cancel` so the harvest drains; a second one returns `true` and the caller
/// should exit immediately. Returns `false` if the signal source fails.
pub async fn watch_interrupts<F, Fut>(mut next_signal: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        error!("Failed to listen for interrupt signal: {}", e);
        return false;
    }
    warn!("Interrupt received; finishing in-flight work and flushing. Interrupt again to exit now.");
    cancel.cancel();

    if let Err(e) = next_signal().await {
        error!("Failed to listen for interrupt signal: {}", e);
        return false;
    }
    warn!("Second interrupt received; exiting without waiting for the final flush");
    true
}
