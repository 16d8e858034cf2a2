use crate::data_model::NormalizedMovie;
use crate::error::Result;

/// Trait for durably writing batches of normalized movies.
pub trait BaseWriter {
    /// Write one batch. Each call is one independent durable write.
    fn write_batch(&mut self, records: &[NormalizedMovie]) -> Result<()>;

    /// Finalize the writer once no more batches will arrive.
    fn close(self) -> Result<()>;
}
