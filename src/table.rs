//! CSV files: the intermediate post table and the enriched output written
//! chunk by chunk.

use crate::query::{validate_fields, POST_COLUMNS};
use crate::record::{EnrichedPost, PostRecord, ENRICHED_COLUMNS};
use crate::util::{append_with_backoff, create_with_backoff, ensure_parent_dir, open_with_backoff, replace_file_atomic, tmp_path_for};
use anyhow::{anyhow, bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write `records` restricted to `fields` (in that order) with a header row.
/// The file is written next to `path` and promoted in one rename.
pub fn write_posts_csv(path: &Path, records: &[PostRecord], fields: &[String]) -> Result<usize> {
    validate_fields(fields)?;
    ensure_parent_dir(path)?;
    let tmp = tmp_path_for(path);
    {
        let f = create_with_backoff(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = csv::Writer::from_writer(BufWriter::new(f));
        w.write_record(fields)?;
        for r in records {
            // fields were validated above, so every lookup resolves
            w.write_record(fields.iter().map(|f| r.field(f).unwrap_or_default()))?;
        }
        let f = w
            .into_inner()
            .map_err(|e| anyhow!("flush {}: {}", tmp.display(), e.error()))?
            .into_inner()
            .map_err(|e| anyhow!("flush {}: {}", tmp.display(), e.error()))?;
        f.sync_all().with_context(|| format!("sync {}", tmp.display()))?;
    }
    replace_file_atomic(&tmp, path)?;
    Ok(records.len())
}

/// Read the ten-column post table. Every post column must be present in the
/// header; extra columns are ignored.
pub fn read_posts_csv(path: &Path) -> Result<Vec<PostRecord>> {
    let f = open_with_backoff(path).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(f));
    let headers = rdr.headers().with_context(|| format!("read header of {}", path.display()))?.clone();
    let missing: Vec<&str> = POST_COLUMNS.iter().copied().filter(|c| !headers.iter().any(|h| h == *c)).collect();
    if !missing.is_empty() {
        bail!("{} is missing columns: {}", path.display(), missing.join(", "));
    }
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<PostRecord>().enumerate() {
        // header is line 1, first record line 2
        out.push(row.with_context(|| format!("{} line {}", path.display(), i + 2))?);
    }
    Ok(out)
}

/// Write one enriched chunk. `fresh` truncates the file and writes the header;
/// otherwise rows are appended without one. The data is fsynced before
/// returning the resulting file length.
pub fn append_chunk(path: &Path, rows: &[EnrichedPost], fresh: bool) -> Result<u64> {
    ensure_parent_dir(path)?;
    let f = if fresh { create_with_backoff(path) } else { append_with_backoff(path) }
        .with_context(|| format!("open {} for writing", path.display()))?;
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(BufWriter::new(f));
    if fresh {
        w.write_record(ENRICHED_COLUMNS)?;
    }
    for row in rows {
        w.write_record(row.to_row())?;
    }
    let f: File = w
        .into_inner()
        .map_err(|e| anyhow!("flush {}: {}", path.display(), e.error()))?
        .into_inner()
        .map_err(|e| anyhow!("flush {}: {}", path.display(), e.error()))?;
    f.sync_all().with_context(|| format!("sync {}", path.display()))?;
    Ok(f.metadata()?.len())
}

/// Cut `path` back to `len` bytes, dropping a partially written tail.
pub fn truncate_to(path: &Path, len: u64) -> Result<()> {
    let f = OpenOptions::new().write(true).open(path).with_context(|| format!("open {}", path.display()))?;
    let current = f.metadata()?.len();
    if current < len {
        bail!("{} is {} bytes, shorter than the {} committed bytes", path.display(), current, len);
    }
    if current > len {
        tracing::warn!("Truncating {} from {} to {} bytes (uncommitted tail)", path.display(), current, len);
        f.set_len(len)?;
        f.sync_all()?;
    }
    Ok(())
}
