use std::path::PathBuf;

use clap::Parser;

use crate::config::harvest::{load_harvest_config, HarvestConfig};
use crate::error::Result;

// Define command-line arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Optional YAML file with harvest settings. Flags below override it.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Bearer token for the movie API.
    #[arg(long, env = "API_ACCESS_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Base URL of the movie API.
    #[arg(long, env = "TMDB_BASE_URL")]
    pub base_url: Option<String>,

    /// JSON file holding an array of `{ "id": <integer> }` objects.
    #[arg(short = 'i', long)]
    pub ids_file: Option<PathBuf>,

    /// Directory that receives one JSON file per flushed batch.
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Number of concurrent fetch workers.
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Global outbound request rate.
    #[arg(long)]
    pub requests_per_second: Option<f64>,

    /// Requests allowed back-to-back before the steady rate applies.
    #[arg(long)]
    pub burst: Option<u32>,

    /// Records per output file.
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// Flush a partial batch after this many seconds without a flush.
    #[arg(long)]
    pub flush_timeout_secs: Option<u64>,

    /// Upper bound on waiting for the final flush at shutdown.
    #[arg(long)]
    pub shutdown_timeout_secs: Option<u64>,

    /// Optional: Port for the Prometheus metrics HTTP endpoint
    #[arg(long)]
    pub metrics_port: Option<u16>,

    /// Optional: directory for daily rolling JSON log files.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    pub validate_config: bool,
}

impl Args {
    /// Builds the effective configuration: defaults, then the YAML file, then
    /// whatever was given on the command line or in the environment.
    pub fn into_config(self) -> Result<HarvestConfig> {
        let mut config = match &self.config {
            Some(path) => load_harvest_config(path)?,
            None => HarvestConfig::default(),
        };

        if let Some(token) = self.api_token {
            config.api_token = Some(token);
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(ids_file) = self.ids_file {
            config.ids_file = ids_file;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(rps) = self.requests_per_second {
            config.requests_per_second = rps;
        }
        if let Some(burst) = self.burst {
            config.burst = burst;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(secs) = self.flush_timeout_secs {
            config.flush_timeout_secs = secs;
        }
        if let Some(secs) = self.shutdown_timeout_secs {
            config.shutdown_timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}
