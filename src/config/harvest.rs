use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::pipeline::fetcher::DEFAULT_BASE_URL;
use crate::pipeline::writers::json_writer::DEFAULT_FILE_PREFIX;

/// Tunables for one harvest run, read from YAML and overridden by env/CLI.
#[derive(Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub language: String,
    pub ids_file: PathBuf,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub workers: usize,
    pub requests_per_second: f64,
    pub burst: u32,
    pub batch_size: usize,
    pub flush_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
    pub work_queue_capacity: usize,
    pub result_channel_capacity: usize,
    pub request_timeout_secs: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        HarvestConfig {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: "en-US".to_string(),
            ids_file: PathBuf::from("movie_ids.json"),
            output_dir: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            workers: 500,
            requests_per_second: 50.0,
            burst: 1,
            batch_size: 100,
            flush_timeout_secs: 410,
            shutdown_timeout_secs: 120,
            work_queue_capacity: 10_000,
            result_channel_capacity: 1_000,
            request_timeout_secs: 30,
        }
    }
}

// Hand-written so the credential never reaches a log line.
impl fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("ids_file", &self.ids_file)
            .field("output_dir", &self.output_dir)
            .field("file_prefix", &self.file_prefix)
            .field("workers", &self.workers)
            .field("requests_per_second", &self.requests_per_second)
            .field("burst", &self.burst)
            .field("batch_size", &self.batch_size)
            .field("flush_timeout_secs", &self.flush_timeout_secs)
            .field("shutdown_timeout_secs", &self.shutdown_timeout_secs)
            .field("work_queue_capacity", &self.work_queue_capacity)
            .field("result_channel_capacity", &self.result_channel_capacity)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl HarvestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PipelineError::ConfigValidationError(
                "workers must be greater than 0".to_string(),
            ));
        }
        if !self.requests_per_second.is_finite() || self.requests_per_second <= 0.0 {
            return Err(PipelineError::ConfigValidationError(format!(
                "requests_per_second must be a positive number, got {}",
                self.requests_per_second
            )));
        }
        if self.burst == 0 {
            return Err(PipelineError::ConfigValidationError(
                "burst must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::ConfigValidationError(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.flush_timeout_secs == 0 || self.shutdown_timeout_secs == 0 {
            return Err(PipelineError::ConfigValidationError(
                "flush_timeout_secs and shutdown_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.work_queue_capacity == 0 || self.result_channel_capacity == 0 {
            return Err(PipelineError::ConfigValidationError(
                "work_queue_capacity and result_channel_capacity must be greater than 0"
                    .to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(PipelineError::ConfigValidationError(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The API credential; absent or blank is a fatal startup error.
    pub fn api_token(&self) -> Result<&str> {
        match self.api_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(PipelineError::ConfigError(
                "API credential is missing (set API_ACCESS_TOKEN or pass --api-token)".to_string(),
            )),
        }
    }

    /// Everything a run needs before the first request: valid settings and a credential.
    pub fn check_runnable(&self) -> Result<()> {
        self.validate()?;
        self.api_token().map(|_| ())
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_secs(self.flush_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Loads harvest settings from a YAML file. Keys left out keep their defaults.
pub fn load_harvest_config<P: AsRef<Path>>(config_path: P) -> Result<HarvestConfig> {
    let path_ref = config_path.as_ref();
    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read harvest config file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    serde_yaml::from_str(&config_content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse harvest config YAML from '{}': {}",
            path_ref.display(),
            e
        ))
    })
}
