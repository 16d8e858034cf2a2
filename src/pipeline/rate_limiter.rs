// src/pipeline/rate_limiter.rs

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{PipelineError, Result};
use crate::utils::prometheus_metrics::{RATE_LIMIT_CANCELLED_TOTAL, RATE_LIMIT_WAIT_SECONDS};

/// Longest single sleep between refill checks.
const MAX_WAIT: Duration = Duration::from_secs(60);

/// Process-wide token bucket shared by every worker.
///
/// The bucket holds at most `burst` tokens and refills continuously at
/// `requests_per_second`. It starts full. One token is one outbound request.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_second: f64,
    burst: f64,
    // (available tokens, time of last refill)
    bucket: Mutex<(f64, Instant)>,
}

impl RateLimiter {
    pub fn new(requests_per_second: f64, burst: u32) -> Result<Self> {
        if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            return Err(PipelineError::ConfigValidationError(format!(
                "requests_per_second must be a positive number, got {}",
                requests_per_second
            )));
        }
        if burst == 0 {
            return Err(PipelineError::ConfigValidationError(
                "burst must be at least 1".to_string(),
            ));
        }
        let burst = f64::from(burst);
        Ok(Self {
            requests_per_second,
            burst,
            bucket: Mutex::new((burst, Instant::now())),
        })
    }

    /// Waits for one token. Fails with [`PipelineError::RateLimitCancelled`]
    /// if `cancel` fires first; no token is consumed in that case.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        let started = Instant::now();
        loop {
            if cancel.is_cancelled() {
                RATE_LIMIT_CANCELLED_TOTAL.inc();
                return Err(PipelineError::RateLimitCancelled);
            }

            let wait = {
                let mut guard = self.bucket.lock().await;
                let (ref mut tokens, ref mut last) = *guard;
                let now = Instant::now();
                let elapsed = now.duration_since(*last).as_secs_f64();
                *tokens = (*tokens + elapsed * self.requests_per_second).min(self.burst);
                *last = now;
                if *tokens >= 1.0 {
                    *tokens -= 1.0;
                    None
                } else {
                    let need = 1.0 - *tokens;
                    let secs = (need / self.requests_per_second).max(0.001);
                    // Very low rates overflow `Duration`; the loop re-checks after each wait.
                    Some(
                        Duration::try_from_secs_f64(secs)
                            .map_or(MAX_WAIT, |wait| wait.min(MAX_WAIT)),
                    )
                }
            };

            match wait {
                None => {
                    RATE_LIMIT_WAIT_SECONDS.observe(started.elapsed().as_secs_f64());
                    return Ok(());
                }
                Some(wait) => {
                    trace!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit token");
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            RATE_LIMIT_CANCELLED_TOTAL.inc();
                            return Err(PipelineError::RateLimitCancelled);
                        }
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }
    }
}
