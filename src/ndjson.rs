//! NDJSON documents on disk: one JSON object per line. Used by the
//! file-backed post store.

use crate::util::{create_with_backoff, ensure_parent_dir, open_with_backoff, replace_file_atomic, tmp_path_for};
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Buffered line reader that strips `\r?\n` terminators.
pub struct NdjsonReader {
    rdr: BufReader<File>,
}

impl NdjsonReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        let f = open_with_backoff(path)?;
        Ok(Self { rdr: BufReader::with_capacity(64 * 1024, f) })
    }

    /// Read the next line into `buf`. Returns the number of bytes read (0 on EOF).
    pub fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_line(buf)?;
        if n == 0 { return Ok(0); }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') { buf.pop(); }
        }
        Ok(n)
    }
}

/// Load every document in `path`. A missing file is an empty collection;
/// blank lines are skipped; a malformed line is an error naming its number.
pub fn read_documents<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = match NdjsonReader::open(path) {
        Ok(r) => r,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("open {}", path.display())),
    };
    let mut docs = Vec::new();
    let mut line = String::new();
    let mut lineno = 0usize;
    while rdr.read_line(&mut line)? > 0 {
        lineno += 1;
        if line.trim().is_empty() { continue; }
        let doc = serde_json::from_str(&line).with_context(|| format!("{} line {}", path.display(), lineno))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// Replace the contents of `path` with `docs`: written to a temp sibling,
/// fsynced, then renamed into place.
pub fn write_documents_atomic<T: Serialize>(path: &Path, docs: &[T]) -> Result<()> {
    ensure_parent_dir(path)?;
    let tmp = tmp_path_for(path);
    {
        let f = create_with_backoff(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = BufWriter::with_capacity(64 * 1024, f);
        for doc in docs {
            serde_json::to_writer(&mut w, doc)?;
            w.write_all(b"\n")?;
        }
        let f = w.into_inner().map_err(|e| anyhow!("flush {}: {}", tmp.display(), e.error()))?;
        f.sync_all().with_context(|| format!("sync {}", tmp.display()))?;
    }
    replace_file_atomic(&tmp, path)
}
