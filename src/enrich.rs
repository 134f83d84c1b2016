//! Batch enricher: split records into fixed-size chunks, add comments and
//! article text to every row on the worker pool, and append each finished
//! chunk to one CSV file.
//!
//! Chunks run strictly one after another and only this driver touches the
//! output file. Any per-row error aborts the run before the failing chunk is
//! written; the checkpoint written after each committed chunk lets the next
//! run pick up where this one stopped.

use crate::archive::ArchiveClient;
use crate::checkpoint::{checkpoint_path, Checkpoint};
use crate::comments::aggregate_comments;
use crate::concurrency::WorkerPool;
use crate::progress::make_chunk_progress;
use crate::record::{EnrichedPost, PostRecord};
use crate::scrape::{scrape_content, ArticleExtractor};
use crate::table::{append_chunk, truncate_to};
use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use std::path::Path;

#[derive(Clone, Debug)]
pub struct EnrichSettings {
    pub chunk_size: usize,
    pub comment_limit: usize,
    pub comment_max_length: Option<usize>,
    pub progress: bool,
    pub progress_label: Option<String>,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self { chunk_size: 100, comment_limit: 20, comment_max_length: None, progress: true, progress_label: None }
    }
}

/// What a run did. `chunks_skipped` counts chunks already committed by an
/// earlier, interrupted run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub chunks_total: usize,
    pub chunks_written: usize,
    pub chunks_skipped: usize,
    pub rows_written: usize,
}

pub struct Enricher<'a, A: ArchiveClient + ?Sized, X: ArticleExtractor + ?Sized> {
    archive: &'a A,
    extractor: &'a X,
    pool: WorkerPool,
    settings: EnrichSettings,
}

impl<'a, A: ArchiveClient + ?Sized, X: ArticleExtractor + ?Sized> Enricher<'a, A, X> {
    pub fn new(archive: &'a A, extractor: &'a X, pool: WorkerPool, settings: EnrichSettings) -> Self {
        Self { archive, extractor, pool, settings }
    }

    pub fn settings(&self) -> &EnrichSettings {
        &self.settings
    }

    /// Comments first, then article content, each as one pass over the pool.
    /// Output rows keep the order of `chunk`.
    pub fn enrich_chunk(&self, chunk: &[PostRecord], pb: Option<&ProgressBar>) -> Result<Vec<EnrichedPost>> {
        let limit = self.settings.comment_limit;
        let max_len = self.settings.comment_max_length;

        let comments = self.pool.try_map(chunk, |rec| {
            let joined = aggregate_comments(self.archive, &rec.subreddit, &rec.id, limit, max_len);
            if let Some(pb) = pb { pb.inc(1); }
            joined
        })?;

        let contents = self.pool.map(chunk, |rec| {
            let text = scrape_content(self.extractor, &rec.url);
            if let Some(pb) = pb { pb.inc(1); }
            text
        });

        Ok(chunk
            .iter()
            .zip(comments)
            .zip(contents)
            .map(|((post, comments), url_content)| EnrichedPost { post: post.clone(), comments, url_content })
            .collect())
    }

    pub fn run(&self, records: &[PostRecord], output: &Path) -> Result<EnrichSummary> {
        let chunk_size = self.settings.chunk_size;
        if chunk_size == 0 {
            bail!("chunk size must be at least 1");
        }
        let total_chunks = records.len().div_ceil(chunk_size);
        let mut summary = EnrichSummary { chunks_total: total_chunks, ..Default::default() };
        if records.is_empty() {
            tracing::warn!("No records to enrich; {} not written", output.display());
            return Ok(summary);
        }

        let cp_path = checkpoint_path(output);
        let mut cp = match Checkpoint::load(&cp_path)? {
            Some(cp) => {
                cp.ensure_compatible(chunk_size, records)?;
                truncate_to(output, cp.committed_bytes)
                    .with_context(|| format!("restoring {} to checkpoint", output.display()))?;
                tracing::info!("Resuming {}: {} of {} chunks already written", output.display(), cp.chunks_done, total_chunks);
                cp
            }
            None => Checkpoint::new(chunk_size, records),
        };

        tracing::info!(
            "Enriching {} records in {} chunks of {} on {} workers",
            records.len(), total_chunks, chunk_size, self.pool.threads()
        );

        for (idx, chunk) in records.chunks(chunk_size).enumerate() {
            if idx < cp.chunks_done {
                summary.chunks_skipped += 1;
                continue;
            }

            let pb = self
                .settings
                .progress
                .then(|| make_chunk_progress(idx, total_chunks, chunk.len(), self.settings.progress_label.as_deref()));
            let enriched = self
                .enrich_chunk(chunk, pb.as_ref())
                .with_context(|| format!("enriching chunk {idx}"))?;

            let committed = append_chunk(output, &enriched, idx == 0)
                .with_context(|| format!("writing chunk {idx} to {}", output.display()))?;
            cp.record_chunk(enriched.len(), committed);
            cp.save(&cp_path)?;

            if let Some(pb) = pb {
                pb.finish_with_message(format!("chunk {}/{} done", idx + 1, total_chunks));
            }
            tracing::info!("Chunk {} done ({} rows)", idx, enriched.len());
            summary.chunks_written += 1;
        }

        summary.rows_written = cp.rows_written;
        Checkpoint::remove(&cp_path)?;
        Ok(summary)
    }
}
