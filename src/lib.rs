pub mod aggregator_logic;
pub mod config;
pub mod data_model;
pub mod driver;
pub mod error;
pub mod pipeline;
pub mod utils;
pub mod worker_logic;

pub use data_model::{HarvestSummary, MovieId, NormalizedMovie};
pub use error::{PipelineError, Result};
