use crate::data_model::MovieId;
use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The Error type for harvest operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidationError(String),

    #[error("Failed to read identifier source '{path}': {reason}")]
    InputError { path: String, reason: String },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization/Deserialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("HTTP client error: {0}")]
    HttpClientError(String),

    #[error("Rate limiter wait cancelled")]
    RateLimitCancelled,

    #[error("Transport error fetching movie {id}: {reason}")]
    FetchTransportError { id: MovieId, reason: String },

    #[error("Unexpected HTTP status {code} fetching movie {id}")]
    FetchStatusError { id: MovieId, code: u16 },

    #[error("Malformed body for movie {id}: {reason}")]
    FetchDecodeError { id: MovieId, reason: String },

    #[error("Record does not match schema: {0}")]
    NormalizeSchemaError(String),

    #[error("Failed to write batch to '{path}': {reason}")]
    WriteError { path: String, reason: String },

    #[error("Aggregator did not finish draining within {secs}s")]
    ShutdownTimeout { secs: u64 },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// True for failures that only cost a single identifier; the pipeline keeps going.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            PipelineError::RateLimitCancelled
                | PipelineError::FetchTransportError { .. }
                | PipelineError::FetchStatusError { .. }
                | PipelineError::FetchDecodeError { .. }
                | PipelineError::NormalizeSchemaError(_)
        )
    }

    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ConfigError(_) => "config",
            PipelineError::ConfigValidationError(_) => "config_validation",
            PipelineError::InputError { .. } => "input",
            PipelineError::IoError { .. } => "io",
            PipelineError::SerializationError { .. } => "serialization",
            PipelineError::HttpClientError(_) => "http_client",
            PipelineError::RateLimitCancelled => "rate_limit_cancelled",
            PipelineError::FetchTransportError { .. } => "transport",
            PipelineError::FetchStatusError { .. } => "status",
            PipelineError::FetchDecodeError { .. } => "decode",
            PipelineError::NormalizeSchemaError(_) => "schema",
            PipelineError::WriteError { .. } => "write",
            PipelineError::ShutdownTimeout { .. } => "shutdown_timeout",
            PipelineError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::HttpClientError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Unexpected(format!("Task failed to complete: {}", err))
    }
}
