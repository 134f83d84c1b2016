//! Resumability marker for the batch enricher.
//!
//! After every committed chunk the enricher records how many chunks are done
//! and how long the output file was at that point. A re-run over the same
//! input and chunking truncates any torn tail and continues with the next chunk.

use crate::record::PostRecord;
use crate::util::{create_with_backoff, open_with_backoff, remove_if_exists, replace_file_atomic, tmp_path_for};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub chunk_size: usize,
    pub total_rows: usize,
    /// Ids of the first and last input rows; a different file with the same
    /// row count must not resume onto these committed rows.
    #[serde(default)]
    pub first_id: Option<String>,
    #[serde(default)]
    pub last_id: Option<String>,
    pub chunks_done: usize,
    pub rows_written: usize,
    pub committed_bytes: u64,
}

/// `<output>.checkpoint.json`, next to the output file.
pub fn checkpoint_path(output: &Path) -> PathBuf {
    let name = output.file_name().and_then(|s| s.to_str()).unwrap_or("output");
    output.with_file_name(format!("{name}.checkpoint.json"))
}

impl Checkpoint {
    pub fn new(chunk_size: usize, records: &[PostRecord]) -> Self {
        let (first_id, last_id) = input_bounds(records);
        Self { chunk_size, total_rows: records.len(), first_id, last_id, chunks_done: 0, rows_written: 0, committed_bytes: 0 }
    }

    /// `Ok(None)` when no checkpoint exists.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let f = match open_with_backoff(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("open {}", path.display())),
        };
        let cp = serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(cp))
    }

    /// Write to a temp file, fsync, then rename over `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = tmp_path_for(path);
        {
            let f = create_with_backoff(&tmp).with_context(|| format!("create {}", tmp.display()))?;
            let mut w = BufWriter::new(f);
            serde_json::to_writer_pretty(&mut w, self)?;
            w.write_all(b"\n")?;
            let f = w.into_inner().map_err(|e| e.into_error())?;
            f.sync_all()?;
        }
        replace_file_atomic(&tmp, path)
    }

    pub fn remove(path: &Path) -> Result<()> {
        remove_if_exists(path)
    }

    /// A checkpoint only applies to the same input (row count and boundary
    /// ids) and the same chunking.
    pub fn ensure_compatible(&self, chunk_size: usize, records: &[PostRecord]) -> Result<()> {
        if self.chunk_size != chunk_size || self.total_rows != records.len() {
            bail!(
                "checkpoint was written for {} rows in chunks of {}, this run has {} rows in chunks of {}; \
                 delete the checkpoint to start over",
                self.total_rows, self.chunk_size, records.len(), chunk_size
            );
        }
        let (first_id, last_id) = input_bounds(records);
        if self.first_id != first_id || self.last_id != last_id {
            bail!(
                "checkpoint was written for input {:?}..{:?}, this input is {:?}..{:?}; \
                 delete the checkpoint to start over",
                self.first_id, self.last_id, first_id, last_id
            );
        }
        Ok(())
    }

    pub fn record_chunk(&mut self, rows: usize, committed_bytes: u64) {
        self.chunks_done += 1;
        self.rows_written += rows;
        self.committed_bytes = committed_bytes;
    }
}

fn input_bounds(records: &[PostRecord]) -> (Option<String>, Option<String>) {
    (records.first().map(|r| r.id.clone()), records.last().map(|r| r.id.clone()))
}
