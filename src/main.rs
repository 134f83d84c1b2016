use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use indicatif::MultiProgress;
use std::path::PathBuf;
use std::sync::Arc;
use subharvest::{init_tracing_once, parse_date_epoch, set_global_multiprogress, Harvest, HarvestOptions, TimeWindow};

const RAW_CSV: &str = "raw_reddit_news_posts.csv";
const ENRICHED_CSV: &str = "raw_reddit_news_posts_comments.csv";

#[derive(Parser)]
#[command(name = "subharvest")]
#[command(about = "Harvest subreddit posts, enrich them with top comments and article text")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch submissions from the archive into a CSV table
    Fetch {
        #[command(flatten)]
        fetch: FetchArgs,
        /// Output CSV
        #[arg(long, default_value = RAW_CSV)]
        out: PathBuf,
    },
    /// Add comments and article text to a fetched CSV table
    Enrich {
        #[command(flatten)]
        enrich: EnrichArgs,
        /// Input CSV with the ten post columns
        #[arg(long, default_value = RAW_CSV)]
        input: PathBuf,
        /// Output CSV
        #[arg(long, default_value = ENRICHED_CSV)]
        output: PathBuf,
    },
    /// Fetch, then enrich
    Run {
        #[command(flatten)]
        fetch: FetchArgs,
        #[command(flatten)]
        enrich: EnrichArgs,
        /// Intermediate CSV
        #[arg(long, default_value = RAW_CSV)]
        raw: PathBuf,
        /// Output CSV
        #[arg(long, default_value = ENRICHED_CSV)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct FetchArgs {
    /// Subreddit to search (repeatable)
    #[arg(long = "subreddit")]
    subreddits: Vec<String>,
    /// Window start, YYYY-MM-DD (inclusive)
    #[arg(long)]
    start: Option<String>,
    /// Window end, YYYY-MM-DD (exclusive)
    #[arg(long)]
    end: Option<String>,
    /// Stop after this many submissions (default: the whole window).
    /// Up to one page, these are the archive's top by score.
    #[arg(long)]
    size: Option<usize>,
    /// Submissions per archive request
    #[arg(long)]
    page_size: Option<usize>,
    #[arg(long)]
    min_comments: Option<i64>,
    #[arg(long)]
    min_score: Option<i64>,
    /// Keep posts whose selftext is longer than this many characters
    #[arg(long)]
    min_selftext_len: Option<usize>,
    /// Columns to keep, comma separated
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,
}

#[derive(Args)]
struct EnrichArgs {
    #[arg(long)]
    chunk_size: Option<usize>,
    #[arg(long)]
    comment_limit: Option<usize>,
    #[arg(long)]
    comment_max_length: Option<usize>,
    /// Worker threads (default: every core but one)
    #[arg(long)]
    jobs: Option<usize>,
    #[arg(long)]
    no_progress: bool,
}

impl FetchArgs {
    fn apply(&self, mut opts: HarvestOptions) -> Result<HarvestOptions> {
        if !self.subreddits.is_empty() {
            opts = opts.with_subreddits(self.subreddits.iter().cloned());
        }
        let after = match &self.start { Some(s) => parse_date_epoch(s)?, None => opts.window.after };
        let before = match &self.end { Some(s) => parse_date_epoch(s)?, None => opts.window.before };
        opts = opts.with_window(TimeWindow::new(after, before));
        if !self.fields.is_empty() {
            opts = opts.with_fields(self.fields.iter().cloned());
        }
        if let Some(n) = self.page_size {
            opts = opts.with_page_size(n);
        }
        let size = self.size.or(opts.size);
        let min_comments = self.min_comments.or(opts.min_comments);
        let min_score = self.min_score.or(opts.min_score);
        let min_selftext_len = self.min_selftext_len.or(opts.min_selftext_len);
        Ok(opts
            .with_size(size)
            .with_min_comments(min_comments)
            .with_min_score(min_score)
            .with_min_selftext_len(min_selftext_len))
    }
}

impl EnrichArgs {
    fn apply(&self, mut opts: HarvestOptions) -> HarvestOptions {
        if let Some(n) = self.chunk_size { opts = opts.with_chunk_size(n); }
        if let Some(n) = self.comment_limit { opts = opts.with_comment_limit(n); }
        if let Some(n) = self.comment_max_length { opts = opts.with_comment_max_length(Some(n)); }
        if let Some(n) = self.jobs { opts = opts.with_parallelism(n); }
        opts.with_progress(!self.no_progress)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_once();
    let base = HarvestOptions::default().from_env()?;
    set_global_multiprogress(Arc::new(MultiProgress::new()));

    match cli.command {
        Commands::Fetch { fetch, out } => {
            let harvest = Harvest::with_options(fetch.apply(base)?);
            match harvest.fetch_to_csv(&out)? {
                Some(n) => println!("Fetched {} posts into {}", n, out.display()),
                None => println!("Empty result; {} not written", out.display()),
            }
        }
        Commands::Enrich { enrich, input, output } => {
            let harvest = Harvest::with_options(enrich.apply(base));
            let summary = harvest.enrich_csv(&input, &output)?;
            println!(
                "Enriched {} rows into {} ({} chunks written, {} resumed)",
                summary.rows_written, output.display(), summary.chunks_written, summary.chunks_skipped
            );
        }
        Commands::Run { fetch, enrich, raw, output } => {
            let harvest = Harvest::with_options(enrich.apply(fetch.apply(base)?));
            match harvest.run(&raw, &output)? {
                Some(summary) => println!("Enriched {} rows into {}", summary.rows_written, output.display()),
                None => println!("Empty result; nothing to enrich"),
            }
        }
    }
    Ok(())
}
