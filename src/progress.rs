//! Progress bars for enrichment chunks. The CLI installs one `MultiProgress`
//! so finished chunk bars stay stacked above the running one.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

static BARS: OnceLock<Arc<MultiProgress>> = OnceLock::new();

/// First call wins; later calls are ignored.
pub fn set_global_multiprogress(mp: Arc<MultiProgress>) {
    let _ = BARS.set(mp);
}

fn attach(pb: ProgressBar) -> ProgressBar {
    match BARS.get() {
        Some(mp) => mp.add(pb),
        None => pb,
    }
}

fn rows_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {per_sec} eta {eta}")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Bar counting `total` units of work under `label`.
pub fn make_count_progress(total: u64, label: &str) -> ProgressBar {
    let pb = attach(ProgressBar::new(total));
    pb.set_style(rows_style());
    pb.set_message(label.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Bar for one enrichment chunk. Each row ticks twice: once when its comments
/// are joined, once when its article is scraped.
pub fn make_chunk_progress(chunk_idx: usize, total_chunks: usize, rows: usize, label: Option<&str>) -> ProgressBar {
    let label = format!("{} {}/{}", label.unwrap_or("chunk"), chunk_idx + 1, total_chunks);
    make_count_progress(rows as u64 * 2, &label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_bar_counts_both_passes() {
        let pb = make_chunk_progress(1, 3, 50, None);
        assert_eq!(pb.length(), Some(100));
        assert_eq!(pb.message(), "chunk 2/3");
        pb.finish_and_clear();
    }
}
