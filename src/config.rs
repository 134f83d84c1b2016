use crate::archive::{DEFAULT_ARCHIVE_URL, MAX_PAGE_SIZE};
use crate::date::{date_epoch, TimeWindow};
use crate::query::POST_COLUMNS;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

/// Pipeline options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HarvestOptions {
    pub archive_url: String,
    pub subreddits: Vec<String>,       // normalized by the query, "r/" allowed here
    pub window: TimeWindow,            // [after, before)
    pub fields: Vec<String>,           // columns kept by the fetch stage
    pub size: Option<usize>,           // total cap, None = whole window
    pub page_size: usize,
    pub min_comments: Option<i64>,
    pub min_score: Option<i64>,
    pub min_selftext_len: Option<usize>,

    pub chunk_size: usize,
    pub comment_limit: usize,
    pub comment_max_length: Option<usize>,
    pub parallelism: Option<usize>,    // None = every core but one
    pub request_timeout: Duration,
    pub user_agent: String,
    pub progress: bool,
    pub progress_label: Option<String>,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        // 2020-01-01 .. 2022-09-30, both valid calendar dates
        let after = date_epoch(2020, 1, 1).unwrap_or(1_577_836_800);
        let before = date_epoch(2022, 9, 30).unwrap_or(1_664_496_000);
        Self {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            subreddits: vec!["worldnews".to_string()],
            window: TimeWindow::new(after, before),
            fields: POST_COLUMNS.iter().map(|s| s.to_string()).collect(),
            size: None,
            page_size: MAX_PAGE_SIZE,
            min_comments: None,
            min_score: None,
            min_selftext_len: None,

            chunk_size: 100,
            comment_limit: 20,
            comment_max_length: None,
            parallelism: None,
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("subharvest/", env!("CARGO_PKG_VERSION")).to_string(),
            progress: true,
            progress_label: None,
        }
    }
}

impl HarvestOptions {
    pub fn with_archive_url(mut self, url: impl Into<String>) -> Self {
        self.archive_url = url.into();
        self
    }
    pub fn with_subreddits<I, S>(mut self, subs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subreddits = subs.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_size(mut self, size: Option<usize>) -> Self {
        self.size = size;
        self
    }
    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n.clamp(1, MAX_PAGE_SIZE);
        self
    }
    pub fn with_min_comments(mut self, n: Option<i64>) -> Self {
        self.min_comments = n;
        self
    }
    pub fn with_min_score(mut self, n: Option<i64>) -> Self {
        self.min_score = n;
        self
    }
    pub fn with_min_selftext_len(mut self, n: Option<usize>) -> Self {
        self.min_selftext_len = n;
        self
    }
    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }
    pub fn with_comment_limit(mut self, n: usize) -> Self {
        self.comment_limit = n;
        self
    }
    pub fn with_comment_max_length(mut self, n: Option<usize>) -> Self {
        self.comment_max_length = n;
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads.max(1));
        self
    }
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }

    /// Merge overrides from the environment:
    /// - SUBHARVEST_ARCHIVE_URL
    /// - SUBHARVEST_SUBREDDITS: comma/space separated
    /// - SUBHARVEST_CHUNK_SIZE, SUBHARVEST_COMMENT_LIMIT, SUBHARVEST_COMMENT_MAX_LENGTH
    /// - SUBHARVEST_PAGE_SIZE, SUBHARVEST_PARALLELISM, SUBHARVEST_TIMEOUT_SECS
    pub fn from_env(mut self) -> Result<Self> {
        if let Some(url) = env_str("SUBHARVEST_ARCHIVE_URL") {
            self.archive_url = url;
        }
        if let Some(subs) = env_str("SUBHARVEST_SUBREDDITS") {
            let list: Vec<String> = subs
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !list.is_empty() {
                self.subreddits = list;
            }
        }
        if let Some(n) = env_parse::<usize>("SUBHARVEST_CHUNK_SIZE")? {
            self = self.with_chunk_size(n);
        }
        if let Some(n) = env_parse::<usize>("SUBHARVEST_COMMENT_LIMIT")? {
            self.comment_limit = n;
        }
        if let Some(n) = env_parse::<usize>("SUBHARVEST_COMMENT_MAX_LENGTH")? {
            self.comment_max_length = Some(n);
        }
        if let Some(n) = env_parse::<usize>("SUBHARVEST_PAGE_SIZE")? {
            self = self.with_page_size(n);
        }
        if let Some(n) = env_parse::<usize>("SUBHARVEST_PARALLELISM")? {
            self = self.with_parallelism(n);
        }
        if let Some(n) = env_parse::<u64>("SUBHARVEST_TIMEOUT_SECS")? {
            self.request_timeout = Duration::from_secs(n);
        }
        Ok(self)
    }
}

/// Settings for the posts API, read from the environment after loading `.env`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub store_uri: String, // memory:// or file:///path/to/dir
    pub db_name: String,
    pub bind_addr: String,
}

impl ServiceConfig {
    pub const DEFAULT_BIND: &'static str = "127.0.0.1:8000";

    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let store_uri = env_str("POSTS_STORE_URI").context("POSTS_STORE_URI environment variable must be set")?;
        let db_name = env_str("POSTS_DB_NAME").context("POSTS_DB_NAME environment variable must be set")?;
        let bind_addr = env_str("POSTS_BIND_ADDR").unwrap_or_else(|| Self::DEFAULT_BIND.to_string());
        Ok(Self { store_uri, db_name, bind_addr })
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_str(key)
        .map(|v| v.parse::<T>().with_context(|| format!("{key}={v:?} is not valid")))
        .transpose()
}
