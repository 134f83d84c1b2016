mod config;
mod date;
mod query;
mod record;

mod archive;
mod fetcher;
mod comments;
mod scrape;

mod progress;
mod concurrency;
mod checkpoint;
mod table;
mod enrich;
mod util;
mod pipeline;

mod ndjson;
pub mod store;
pub mod api;

pub use crate::config::{HarvestOptions, ServiceConfig};
pub use crate::date::{date_epoch, format_csv, parse_date_epoch, parse_timestamp, TimeWindow};
pub use crate::query::{CommentQuery, SubmissionQuery, POST_COLUMNS};
pub use crate::record::{EnrichedPost, PostRecord, RawComment, RawSubmission, ENRICHED_COLUMNS};
pub use crate::pipeline::Harvest;

// archive seam + live client
pub use crate::archive::{ArchiveClient, PushshiftClient, DEFAULT_ARCHIVE_URL};

// the three per-record stages
pub use crate::fetcher::{fetch_submissions, Fetched};
pub use crate::comments::{aggregate_comments, join_comment_bodies, COMMENT_SEPARATOR};
pub use crate::scrape::{extract_main_text, scrape_content, ArticleExtractor, HtmlArticleExtractor, NOT_AVAILABLE};

// batch enrichment and its resumability marker
pub use crate::enrich::{EnrichSettings, EnrichSummary, Enricher};
pub use crate::checkpoint::{checkpoint_path, Checkpoint};
pub use crate::concurrency::WorkerPool;

// tabular files
pub use crate::table::{append_chunk, read_posts_csv, write_posts_csv};

// Expose multiprogress and progress helpers.
pub use crate::progress::{set_global_multiprogress, make_count_progress};

pub use crate::util::{default_worker_count, init_tracing_once};
