// src/pipeline/readers/id_reader.rs

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data_model::{MovieId, MovieIdEntry};
use crate::error::{PipelineError, Result};
use crate::pipeline::readers::BaseReader;

/// Reads identifiers from a JSON array of `{ "id": <integer> }` objects.
///
/// Any failure here is fatal: the harvest does not start on a partial list.
#[derive(Debug, Clone)]
pub struct JsonIdReader {
    path: PathBuf,
}

impl JsonIdReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonIdReader {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn input_error(&self, reason: impl ToString) -> PipelineError {
        PipelineError::InputError {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl BaseReader for JsonIdReader {
    fn read_ids(&self) -> Result<Vec<MovieId>> {
        let file = File::open(&self.path).map_err(|e| self.input_error(e))?;
        let entries: Vec<MovieIdEntry> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| self.input_error(e))?;

        info!(path = %self.path.display(), count = entries.len(), "Loaded movie identifiers");
        Ok(entries.into_iter().map(|entry| entry.id).collect())
    }
}
