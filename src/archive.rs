//! Archive search client: the `ArchiveClient` seam and a Pushshift-compatible
//! HTTP implementation.

use crate::query::{CommentQuery, SubmissionQuery};
use crate::record::{RawComment, RawSubmission};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_ARCHIVE_URL: &str = "https://api.pushshift.io";
const SUBMISSION_PATH: &str = "/reddit/search/submission/";
const COMMENT_PATH: &str = "/reddit/search/comment/";

/// Largest page the archive serves in one response.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Opaque search service over historical submissions and comments.
///
/// Implementations are called from worker threads, hence `Send + Sync`.
/// An empty `Vec` means the query succeeded and matched nothing; transport
/// and decoding failures are errors.
pub trait ArchiveClient: Send + Sync {
    fn search_submissions(&self, query: &SubmissionQuery) -> Result<Vec<RawSubmission>>;
    fn search_comments(&self, query: &CommentQuery) -> Result<Vec<RawComment>>;
}

#[derive(Deserialize)]
struct SearchResponse<T> {
    data: Vec<T>,
}

pub struct PushshiftClient {
    client: Client,
    base_url: String,
}

impl PushshiftClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("building archive HTTP client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn search<T: DeserializeOwned>(&self, path: &str, params: &[(&'static str, String)]) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {} {:?}", url, params);
        let resp: SearchResponse<T> = self
            .client
            .get(&url)
            .query(params)
            .send()
            .with_context(|| format!("request {url}"))?
            .error_for_status()
            .with_context(|| format!("archive rejected {url}"))?
            .json()
            .with_context(|| format!("decode response from {url}"))?;
        Ok(resp.data)
    }
}

impl ArchiveClient for PushshiftClient {
    fn search_submissions(&self, query: &SubmissionQuery) -> Result<Vec<RawSubmission>> {
        self.search(SUBMISSION_PATH, &submission_params(query))
    }

    fn search_comments(&self, query: &CommentQuery) -> Result<Vec<RawComment>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }
        self.search(COMMENT_PATH, &comment_params(query))
    }
}

/// Query-string parameters for one page of a submission search.
/// Numeric minimums are sent as the archive's strict `>` filter; `size` is
/// the page size, never above what the archive serves per response.
pub fn submission_params(q: &SubmissionQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("subreddit", q.subreddit_param()),
        ("after", q.window.after.saturating_sub(1).to_string()),
        ("before", q.window.before.to_string()),
        ("sort", q.sort.clone()),
        ("filter", q.archive_fields().join(",")),
        ("size", q.size.unwrap_or(q.page_size).min(MAX_PAGE_SIZE).to_string()),
    ];
    if let Some(n) = q.min_comments {
        params.push(("num_comments", format!(">{}", n.saturating_sub(1))));
    }
    if let Some(n) = q.min_score {
        params.push(("score", format!(">{}", n.saturating_sub(1))));
    }
    params
}

/// Query-string parameters for a top-comment search.
pub fn comment_params(q: &CommentQuery) -> Vec<(&'static str, String)> {
    vec![
        ("subreddit", q.subreddit.clone()),
        ("link_id", q.link_id.clone()),
        ("sort", q.sort.clone()),
        ("filter", "author,body".to_string()),
        ("size", q.limit.min(MAX_PAGE_SIZE).to_string()),
    ]
}
