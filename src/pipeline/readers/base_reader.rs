use crate::data_model::MovieId;
use crate::error::Result;

/// Trait for loading the full list of identifiers to harvest.
pub trait BaseReader {
    fn read_ids(&self) -> Result<Vec<MovieId>>;
}
