// src/pipeline/fetcher.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::{debug, instrument};

use crate::data_model::{MovieId, RawRecord};
use crate::error::{PipelineError, Result};
use crate::utils::prometheus_metrics::{ACTIVE_FETCHES, FETCH_DURATION_SECONDS};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const APPEND_TO_RESPONSE: &str = "release_dates,credits";

/// Retrieves one raw record per identifier. Implementations perform a single
/// attempt and never retry.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    async fn fetch(&self, id: MovieId) -> Result<RawRecord>;
}

/// Fetches movie details from the TMDB v3 API with bearer authentication.
#[derive(Clone)]
pub struct TmdbFetcher {
    client: Client,
    base_url: String,
    api_token: String,
    language: String,
}

impl TmdbFetcher {
    pub fn new(
        base_url: &str,
        api_token: &str,
        language: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            language: language.to_string(),
        })
    }

    pub fn movie_url(&self, id: MovieId) -> String {
        format!("{}/movie/{}", self.base_url, id)
    }
}

#[async_trait]
impl RecordFetcher for TmdbFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, id: MovieId) -> Result<RawRecord> {
        ACTIVE_FETCHES.inc();
        let timer = FETCH_DURATION_SECONDS.start_timer();
        let result = self.fetch_inner(id).await;
        timer.observe_duration();
        ACTIVE_FETCHES.dec();
        result
    }
}

impl TmdbFetcher {
    async fn fetch_inner(&self, id: MovieId) -> Result<RawRecord> {
        let response = self
            .client
            .get(self.movie_url(id))
            .query(&[
                ("append_to_response", APPEND_TO_RESPONSE),
                ("language", self.language.as_str()),
            ])
            .header(header::ACCEPT, "application/json")
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| PipelineError::FetchTransportError {
                id,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PipelineError::FetchStatusError {
                id,
                code: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::FetchTransportError {
                id,
                reason: e.to_string(),
            })?;
        debug!(movie_id = id, bytes = body.len(), "Fetched movie body");

        serde_json::from_slice::<RawRecord>(&body).map_err(|e| PipelineError::FetchDecodeError {
            id,
            reason: e.to_string(),
        })
    }
}
