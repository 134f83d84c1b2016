//! Archive query specifications for submissions and comments, plus the
//! normalization helpers they share.

use crate::archive::MAX_PAGE_SIZE;
use crate::date::TimeWindow;
use anyhow::{bail, Result};

/// The ten post columns, in output order.
pub const POST_COLUMNS: [&str; 10] = [
    "id",
    "subreddit",
    "author",
    "created_utc",
    "domain",
    "url",
    "title",
    "num_comments",
    "selftext",
    "score",
];

/// Top first. Comment searches, and submission searches that fit in a
/// single response.
pub const SORT_SCORE_DESC: &str = "score:desc";

/// Ordering for paged submission searches. Pages are walked oldest-first so
/// the newest `created_utc` of a page is the cursor for the next one.
pub const SORT_CREATED_ASC: &str = "created_utc:asc";

/// Columns every submission request asks for, whatever the output keeps:
/// rows without them cannot be placed or paged.
const CURSOR_COLUMNS: [&str; 2] = ["id", "created_utc"];

/// Submission search: subreddit set, half-open window, numeric filters and
/// the column list to keep.
#[derive(Clone, Debug)]
pub struct SubmissionQuery {
    pub subreddits: Vec<String>, // normalized lowercase, no "r/"
    pub window: TimeWindow,
    pub fields: Vec<String>,
    pub sort: String,
    pub size: Option<usize>,             // total cap across pages, None = whole window
    pub page_size: usize,
    pub min_comments: Option<i64>,
    pub min_score: Option<i64>,
    pub min_selftext_len: Option<usize>, // keep rows whose selftext is strictly longer
}

impl SubmissionQuery {
    pub fn new(subreddits: &[String], window: TimeWindow) -> Self {
        Self {
            subreddits: subreddits.to_vec(),
            window,
            fields: POST_COLUMNS.iter().map(|s| s.to_string()).collect(),
            sort: SORT_SCORE_DESC.to_string(),
            size: None,
            page_size: MAX_PAGE_SIZE,
            min_comments: None,
            min_score: None,
            min_selftext_len: None,
        }
        .normalize()
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_size(mut self, size: Option<usize>) -> Self { self.size = size; self }
    pub fn with_page_size(mut self, n: usize) -> Self { self.page_size = n.clamp(1, MAX_PAGE_SIZE); self }
    pub fn with_min_comments(mut self, n: Option<i64>) -> Self { self.min_comments = n; self }
    pub fn with_min_score(mut self, n: Option<i64>) -> Self { self.min_score = n; self }
    pub fn with_min_selftext_len(mut self, n: Option<usize>) -> Self { self.min_selftext_len = n; self }

    /// Lowercase subreddits, strip `r/`, drop blanks, sort + dedup.
    pub fn normalize(mut self) -> Self {
        let mut subs: Vec<String> = self.subreddits.iter().map(|s| normalize_str(s)).filter(|s| !s.is_empty()).collect();
        subs.sort();
        subs.dedup();
        self.subreddits = subs;
        for f in self.fields.iter_mut() {
            *f = f.trim().to_string();
        }
        self
    }

    /// One page of this search: the window from `after` on, oldest first, at
    /// most `size` rows.
    pub fn page(&self, after: i64, size: usize) -> Self {
        let mut q = self.clone();
        q.window = TimeWindow::new(after, self.window.before);
        q.sort = SORT_CREATED_ASC.to_string();
        q.size = Some(size);
        q
    }

    /// `Some(n)` when `size` fits in one response, which then holds the
    /// archive's own top `n` by score.
    pub fn single_page(&self) -> Option<usize> {
        self.size.filter(|&n| n <= self.page_size)
    }

    /// Requested fields plus the cursor columns, in request order.
    pub fn archive_fields(&self) -> Vec<String> {
        let mut out = self.fields.clone();
        for c in CURSOR_COLUMNS {
            if !out.iter().any(|f| f == c) {
                out.push(c.to_string());
            }
        }
        out
    }

    /// The comma-joined subreddit list the archive expects.
    pub fn subreddit_param(&self) -> String {
        self.subreddits.join(",")
    }

    pub fn validate(&self) -> Result<()> {
        if self.subreddits.is_empty() {
            bail!("at least one subreddit is required");
        }
        if self.window.is_empty() {
            bail!("empty time window {}", self.window);
        }
        validate_fields(&self.fields)
    }
}

/// Top-comment search under one submission.
#[derive(Clone, Debug)]
pub struct CommentQuery {
    pub subreddit: String,
    pub link_id: String,
    pub limit: usize,
    pub sort: String,
}

impl CommentQuery {
    pub fn new(subreddit: &str, link_id: &str, limit: usize) -> Self {
        Self {
            subreddit: normalize_str(subreddit),
            link_id: link_id.trim().to_string(),
            limit,
            sort: SORT_SCORE_DESC.to_string(),
        }
    }
}

/// Every requested field must be one of the ten post columns, with no repeats.
pub fn validate_fields(fields: &[String]) -> Result<()> {
    if fields.is_empty() {
        bail!("field list is empty");
    }
    for (i, f) in fields.iter().enumerate() {
        if !POST_COLUMNS.contains(&f.as_str()) {
            bail!("unknown field {f:?}; expected one of {}", POST_COLUMNS.join(", "));
        }
        if fields[..i].contains(f) {
            bail!("field {f:?} requested twice");
        }
    }
    Ok(())
}

#[inline]
pub fn normalize_str(s: &str) -> String {
    let s = s.trim().to_lowercase();
    if let Some(rest) = s.strip_prefix("r/") { rest.to_string() } else { s }
}
