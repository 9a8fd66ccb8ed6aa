use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Sample;

/// Identifier handed back for a successfully saved graph.
pub type RowId = i64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist graph: {0}")]
    Io(#[from] std::io::Error),
}

/// Sink for saved graphs.
///
/// Saving an empty sample list is valid and must succeed; a graph with
/// no points is still a graph.
pub trait GraphStore {
    fn save_graph(&mut self, name: &str, samples: &[Sample]) -> Result<RowId, StoreError>;
}

/// Keeps saved graphs in memory. Useful for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graphs: Vec<(String, Vec<Sample>)>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graphs(&self) -> &[(String, Vec<Sample>)] {
        &self.graphs
    }
}

impl GraphStore for MemoryGraphStore {
    fn save_graph(&mut self, name: &str, samples: &[Sample]) -> Result<RowId, StoreError> {
        self.graphs.push((name.to_string(), samples.to_vec()));
        Ok(self.graphs.len() as RowId - 1)
    }
}

/// Writes each saved graph as one CSV file under a directory.
///
/// Layout is a header row followed by `timestamp_ms,x,y,z` lines, the
/// same shape the in-memory samples have.
pub struct CsvGraphStore {
    dir: PathBuf,
    next_id: RowId,
}

impl CsvGraphStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, next_id: 0 })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        // Graph names are timestamps like "2026-08-08 14:03:59";
        // spaces and colons make poor file names.
        let stem = name.replace([' ', ':'], "-");
        self.dir.join(format!("{stem}.csv"))
    }
}

impl GraphStore for CsvGraphStore {
    fn save_graph(&mut self, name: &str, samples: &[Sample]) -> Result<RowId, StoreError> {
        let file = File::create(self.file_path(name))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "timestamp_ms,x,y,z")?;
        for sample in samples {
            writeln!(
                writer,
                "{},{:.6},{:.6},{:.6}",
                sample.timestamp_ms,
                sample.axis_values[0],
                sample.axis_values[1],
                sample.axis_values[2]
            )?;
        }
        writer.flush()?;
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }
}
