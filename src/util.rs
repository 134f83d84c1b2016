use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Worker count used when the caller does not pin one: every core but one,
/// never fewer than a single worker.
pub fn default_worker_count() -> usize {
    let hw = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2);
    hw.saturating_sub(1).max(1)
}

// -------- robust file ops with backoff --------

const TRIES: usize = 16;
const DELAY_MS: u64 = 50;

/// Return true for transient/retriable I/O errors (sharing violations, AV
/// filter drivers, flaky network volumes).
fn is_retriable_io_error(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::Interrupted || e.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    // Windows: access denied, sharing/lock violation, device not ready.
    matches!(e.raw_os_error(), Some(5) | Some(32) | Some(33) | Some(21))
}

fn with_backoff<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..TRIES {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(DELAY_MS.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

/// Open a file for reading, retrying transient errors.
pub fn open_with_backoff(path: &Path) -> io::Result<File> {
    with_backoff(|| File::open(path))
}

/// Create (truncate) a file for writing, retrying transient errors.
pub fn create_with_backoff(path: &Path) -> io::Result<File> {
    with_backoff(|| File::create(path))
}

/// Open a file for appending, creating it when missing.
pub fn append_with_backoff(path: &Path) -> io::Result<File> {
    with_backoff(|| OpenOptions::new().create(true).append(true).open(path))
}

/// Sibling temp path used while a file is being rewritten.
pub fn tmp_path_for(dest: &Path) -> PathBuf {
    let name = dest.file_name().and_then(|s| s.to_str()).unwrap_or("out");
    dest.with_file_name(format!(".{name}.tmp"))
}

/// Promote `tmp` over `dest`. On Unix the rename replaces `dest` in one step;
/// if the platform refuses to rename over an existing file we remove `dest`
/// first and retry.
pub fn replace_file_atomic(tmp: &Path, dest: &Path) -> Result<()> {
    match with_backoff(|| fs::rename(tmp, dest)) {
        Ok(()) => Ok(()),
        Err(first) if dest.exists() => {
            tracing::debug!("rename over {} failed ({first}); removing and retrying", dest.display());
            remove_if_exists(dest)?;
            with_backoff(|| fs::rename(tmp, dest))
                .with_context(|| format!("rename {} -> {}", tmp.display(), dest.display()))
        }
        Err(e) => Err(e).with_context(|| format!("rename {} -> {}", tmp.display(), dest.display())),
    }
}

/// Remove a file, succeeding if it does not exist.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match with_backoff(|| fs::remove_file(path)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
    }
}

/// Make sure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
        }
    }
    Ok(())
}
