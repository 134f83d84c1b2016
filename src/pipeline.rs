use crate::archive::{ArchiveClient, PushshiftClient};
use crate::concurrency::WorkerPool;
use crate::config::HarvestOptions;
use crate::date::TimeWindow;
use crate::enrich::{EnrichSettings, EnrichSummary, Enricher};
use crate::fetcher::{fetch_submissions, Fetched};
use crate::query::{SubmissionQuery, POST_COLUMNS};
use crate::scrape::{ArticleExtractor, HtmlArticleExtractor};
use crate::table::{read_posts_csv, write_posts_csv};
use crate::util::{default_worker_count, init_tracing_once};
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Pipeline driver. Holds options only; every stage takes its input and
/// output paths explicitly.
#[derive(Clone, Debug, Default)]
pub struct Harvest {
    pub(crate) opts: HarvestOptions,
}

impl Harvest {
    pub fn new() -> Self {
        Self { opts: HarvestOptions::default() }
    }

    pub fn with_options(opts: HarvestOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &HarvestOptions { &self.opts }

    // -------- Builder methods --------
    pub fn archive_url(mut self, url: impl Into<String>) -> Self { self.opts = self.opts.with_archive_url(url); self }
    pub fn subreddits<I, S>(mut self, subs: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_subreddits(subs); self }
    pub fn window(mut self, window: TimeWindow) -> Self { self.opts = self.opts.with_window(window); self }
    pub fn fields<I, S>(mut self, fields: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_fields(fields); self }
    pub fn size(mut self, size: Option<usize>) -> Self { self.opts = self.opts.with_size(size); self }
    pub fn page_size(mut self, n: usize) -> Self { self.opts = self.opts.with_page_size(n); self }
    pub fn min_comments(mut self, n: Option<i64>) -> Self { self.opts = self.opts.with_min_comments(n); self }
    pub fn min_score(mut self, n: Option<i64>) -> Self { self.opts = self.opts.with_min_score(n); self }
    pub fn min_selftext_len(mut self, n: Option<usize>) -> Self { self.opts = self.opts.with_min_selftext_len(n); self }
    pub fn chunk_size(mut self, n: usize) -> Self { self.opts = self.opts.with_chunk_size(n); self }
    pub fn comment_limit(mut self, n: usize) -> Self { self.opts = self.opts.with_comment_limit(n); self }
    pub fn comment_max_length(mut self, n: Option<usize>) -> Self { self.opts = self.opts.with_comment_max_length(n); self }
    pub fn parallelism(mut self, threads: usize) -> Self { self.opts = self.opts.with_parallelism(threads); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }

    pub fn submission_query(&self) -> SubmissionQuery {
        SubmissionQuery::new(&self.opts.subreddits, self.opts.window)
            .with_fields(self.opts.fields.iter().cloned())
            .with_size(self.opts.size)
            .with_page_size(self.opts.page_size)
            .with_min_comments(self.opts.min_comments)
            .with_min_score(self.opts.min_score)
            .with_min_selftext_len(self.opts.min_selftext_len)
    }

    pub fn enrich_settings(&self) -> EnrichSettings {
        EnrichSettings {
            chunk_size: self.opts.chunk_size,
            comment_limit: self.opts.comment_limit,
            comment_max_length: self.opts.comment_max_length,
            progress: self.opts.progress,
            progress_label: self.opts.progress_label.clone(),
        }
    }

    fn archive_client(&self) -> Result<PushshiftClient> {
        PushshiftClient::new(&self.opts.archive_url, self.opts.request_timeout, &self.opts.user_agent)
    }

    fn article_extractor(&self) -> Result<HtmlArticleExtractor> {
        HtmlArticleExtractor::new(self.opts.request_timeout, &self.opts.user_agent)
    }

    // -------- Stages against the live archive --------

    /// Fetch submissions and write them to `out`. Returns `None` (and writes
    /// nothing) when the archive matched no submissions.
    pub fn fetch_to_csv(&self, out: &Path) -> Result<Option<usize>> {
        let archive = self.archive_client()?;
        self.fetch_to_csv_with(&archive, out)
    }

    /// Read the post table at `input`, enrich it, write `output`.
    pub fn enrich_csv(&self, input: &Path, output: &Path) -> Result<EnrichSummary> {
        let archive = self.archive_client()?;
        let extractor = self.article_extractor()?;
        self.enrich_csv_with(&archive, &extractor, input, output)
    }

    /// Fetch into `raw`, read it back, and enrich into `output`.
    pub fn run(&self, raw: &Path, output: &Path) -> Result<Option<EnrichSummary>> {
        let archive = self.archive_client()?;
        let extractor = self.article_extractor()?;
        self.run_with(&archive, &extractor, raw, output)
    }

    // -------- Stages with injected collaborators --------

    pub fn fetch_to_csv_with<A: ArchiveClient + ?Sized>(&self, archive: &A, out: &Path) -> Result<Option<usize>> {
        init_tracing_once();
        match fetch_submissions(archive, &self.submission_query())? {
            Fetched::Empty => Ok(None),
            Fetched::Records(records) => {
                let n = write_posts_csv(out, &records, &self.opts.fields)
                    .with_context(|| format!("writing {}", out.display()))?;
                tracing::info!("Wrote {} posts to {}", n, out.display());
                Ok(Some(n))
            }
        }
    }

    pub fn enrich_csv_with<A, X>(&self, archive: &A, extractor: &X, input: &Path, output: &Path) -> Result<EnrichSummary>
    where
        A: ArchiveClient + ?Sized,
        X: ArticleExtractor + ?Sized,
    {
        init_tracing_once();
        let records = read_posts_csv(input)?;
        tracing::info!("Loaded {} posts from {}", records.len(), input.display());
        let threads = self.opts.parallelism.unwrap_or_else(default_worker_count);
        let enricher = Enricher::new(archive, extractor, WorkerPool::new(threads)?, self.enrich_settings());
        enricher.run(&records, output)
    }

    pub fn run_with<A, X>(&self, archive: &A, extractor: &X, raw: &Path, output: &Path) -> Result<Option<EnrichSummary>>
    where
        A: ArchiveClient + ?Sized,
        X: ArticleExtractor + ?Sized,
    {
        // the intermediate table feeds the enricher, which needs every post column
        let missing: Vec<&str> = POST_COLUMNS.iter().copied().filter(|c| !self.opts.fields.iter().any(|f| f == c)).collect();
        if !missing.is_empty() {
            bail!("run needs all post columns in the fetch fields; missing: {}", missing.join(", "));
        }
        match self.fetch_to_csv_with(archive, raw)? {
            None => {
                tracing::warn!("Nothing fetched; skipping enrichment");
                Ok(None)
            }
            Some(_) => self.enrich_csv_with(archive, extractor, raw, output).map(Some),
        }
    }
}
