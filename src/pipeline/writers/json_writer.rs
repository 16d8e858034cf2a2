use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::data_model::NormalizedMovie;
use crate::error::{PipelineError, Result};
use crate::pipeline::writers::BaseWriter;

pub const DEFAULT_FILE_PREFIX: &str = "processed_movies";

/// Writes every batch to its own JSON file named by flush time.
///
/// Files are created or truncated, never appended to. The sequence suffix keeps
/// two flushes inside the same timestamp tick from clobbering each other.
pub struct JsonBatchWriter {
    output_dir: PathBuf,
    prefix: String,
    sequence: u64,
    files_written: u64,
    last_file: Option<PathBuf>,
}

impl JsonBatchWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P, prefix: &str) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(JsonBatchWriter {
            output_dir,
            prefix: prefix.to_string(),
            sequence: 0,
            files_written: 0,
            last_file: None,
        })
    }

    pub fn files_written(&self) -> u64 {
        self.files_written
    }

    /// Path of the most recent successful write.
    pub fn last_file(&self) -> Option<&Path> {
        self.last_file.as_deref()
    }

    fn next_path(&mut self) -> PathBuf {
        self.sequence += 1;
        let timestamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
        self.output_dir.join(format!(
            "{}_{}_{:05}.json",
            self.prefix, timestamp, self.sequence
        ))
    }
}

/// Serializes `records` next to `path` and renames into place, so `path` either
/// holds the complete array or does not exist. The partial file is removed on
/// any failure.
pub(crate) fn write_json_file(path: &Path, records: &[NormalizedMovie]) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let write_error = |reason: String| PipelineError::WriteError {
        path: path.display().to_string(),
        reason,
    };

    let written = File::create(&tmp_path)
        .map_err(|e| e.to_string())
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, records).map_err(|e| e.to_string())?;
            writer
                .flush()
                .and_then(|_| writer.get_ref().sync_all())
                .map_err(|e| e.to_string())
        })
        .and_then(|_| fs::rename(&tmp_path, path).map_err(|e| e.to_string()));

    written.map_err(|reason| {
        if tmp_path.exists() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                warn!(path = %tmp_path.display(), error = %e, "Failed to remove partial batch file");
            }
        }
        write_error(reason)
    })
}

impl BaseWriter for JsonBatchWriter {
    fn write_batch(&mut self, records: &[NormalizedMovie]) -> Result<()> {
        let path = self.next_path();
        write_json_file(&path, records)?;

        debug!(path = %path.display(), records = records.len(), "Wrote batch file");
        self.files_written += 1;
        self.last_file = Some(path);
        Ok(())
    }

    fn close(self) -> Result<()> {
        info!(
            output_dir = %self.output_dir.display(),
            files = self.files_written,
            "Batch writer closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn movie(id: u64) -> NormalizedMovie {
        NormalizedMovie {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn test_failed_rename_leaves_no_partial_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("batch_00001.json");
        // A non-empty directory in the way makes the final rename fail after
        // the whole body has been written.
        fs::create_dir(&target).unwrap();
        fs::write(target.join("blocker"), b"x").unwrap();

        let result = write_json_file(&target, &[movie(1), movie(2)]);
        assert!(matches!(result, Err(PipelineError::WriteError { .. })));
        assert!(!dir.path().join("batch_00001.json.tmp").exists());
        assert!(target.is_dir());
    }

    #[test]
    fn test_successful_write_leaves_only_final_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("batch_00001.json");

        write_json_file(&target, &[movie(7)]).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["batch_00001.json".to_string()]);
        let back: Vec<NormalizedMovie> =
            serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(back, vec![movie(7)]);
    }
}
