#![allow(dead_code)]

use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use subharvest::{
    write_posts_csv, ArchiveClient, ArticleExtractor, CommentQuery, PostRecord, RawComment, RawSubmission,
    SubmissionQuery, POST_COLUMNS,
};

/// 2022-05-01 00:00:00 UTC
pub const BASE_TS: i64 = 1_651_363_200;

/// In-memory archive with canned submissions and per-post comments.
/// `fail_comments_for` makes the comment search for that post id fail.
///
/// By default every submission search returns all canned rows. With
/// `serve_pages` it behaves like the real archive: rows inside the requested
/// window, oldest first, at most `size` of them.
#[derive(Default)]
pub struct FakeArchive {
    pub submissions: Vec<RawSubmission>,
    pub comments: HashMap<String, Vec<RawComment>>,
    pub fail_comments_for: Mutex<Option<String>>,
    pub fail_submissions: bool,
    pub serve_pages: bool,
    pub submission_requests: Mutex<Vec<(i64, Option<usize>)>>,
    pub comment_calls: AtomicUsize,
}

impl FakeArchive {
    pub fn with_submissions(submissions: Vec<RawSubmission>) -> Self {
        Self { submissions, ..Default::default() }
    }

    /// Every post id `p0..p{n-1}` gets two comments, `c{i}a` and `c{i}b`.
    pub fn with_comments_for(mut self, n: usize) -> Self {
        for i in 0..n {
            self.comments.insert(
                format!("p{i}"),
                vec![
                    RawComment { author: Some("u1".into()), body: Some(format!("c{i}a")) },
                    RawComment { author: Some("u2".into()), body: None },
                    RawComment { author: Some("u3".into()), body: Some(format!("c{i}b")) },
                ],
            );
        }
        self
    }

    pub fn paged(mut self) -> Self {
        self.serve_pages = true;
        self
    }

    /// `(after, size)` of every submission request, in order.
    pub fn submission_requests(&self) -> Vec<(i64, Option<usize>)> {
        self.submission_requests.lock().clone()
    }

    pub fn fail_on(&self, post_id: Option<&str>) {
        *self.fail_comments_for.lock() = post_id.map(str::to_string);
    }

    pub fn comment_calls(&self) -> usize {
        self.comment_calls.load(Ordering::Relaxed)
    }
}

impl ArchiveClient for FakeArchive {
    fn search_submissions(&self, query: &SubmissionQuery) -> Result<Vec<RawSubmission>> {
        self.submission_requests.lock().push((query.window.after, query.size));
        if self.fail_submissions {
            bail!("archive unavailable");
        }
        if !self.serve_pages {
            return Ok(self.submissions.clone());
        }
        let mut rows: Vec<RawSubmission> = self
            .submissions
            .iter()
            .filter(|r| r.created_utc.is_some_and(|ts| query.window.contains(ts)))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_utc);
        rows.truncate(query.size.unwrap_or(usize::MAX));
        Ok(rows)
    }

    fn search_comments(&self, query: &CommentQuery) -> Result<Vec<RawComment>> {
        self.comment_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_comments_for.lock().as_deref() == Some(query.link_id.as_str()) {
            bail!("comment search failed for {}", query.link_id);
        }
        Ok(self.comments.get(&query.link_id).cloned().unwrap_or_default())
    }
}

/// Extractor that returns `article:<url>` for URLs containing "ok" and fails
/// for everything else.
pub struct FakeExtractor;

impl ArticleExtractor for FakeExtractor {
    fn extract(&self, url: &str) -> Result<String> {
        if url.contains("ok") {
            Ok(format!("article:{url}"))
        } else {
            bail!("no article at {url}")
        }
    }
}

pub fn raw_submission(id: &str, created_utc: i64, score: i64, selftext: Option<&str>) -> RawSubmission {
    RawSubmission {
        id: Some(id.to_string()),
        subreddit: Some("worldnews".to_string()),
        author: Some(format!("author_{id}")),
        created_utc: Some(created_utc),
        domain: Some("example.com".to_string()),
        url: Some(format!("https://example.com/ok/{id}")),
        title: Some(format!("Title {id}")),
        num_comments: Some(3),
        selftext: selftext.map(str::to_string),
        score: Some(score),
    }
}

/// `n` records `p0..p{n-1}`, one minute apart. Every seventh record links to
/// a URL the fake extractor cannot handle.
pub fn make_records(n: usize) -> Vec<PostRecord> {
    (0..n)
        .map(|i| {
            let mut raw = raw_submission(&format!("p{i}"), BASE_TS + 60 * i as i64, 10, None);
            if i % 7 == 3 {
                raw.url = Some(format!("https://example.com/missing/{i}"));
            }
            PostRecord::from_raw(raw).unwrap()
        })
        .collect()
}

pub fn write_input_csv(path: &Path, records: &[PostRecord]) {
    let fields: Vec<String> = POST_COLUMNS.iter().map(|s| s.to_string()).collect();
    write_posts_csv(path, records, &fields).unwrap();
}

/// Header plus records of a CSV file.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let headers = rdr.headers().unwrap().iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

/// Read a text file line-by-line into strings.
pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path).unwrap().lines().map(str::to_string).collect()
}
