//! Record fetcher: page through a submission search, turn payloads into `PostRecord`s,
//! enforce the window and minimum filters locally, and order by creation time.

use crate::archive::ArchiveClient;
use crate::date::TimeWindow;
use crate::query::SubmissionQuery;
use crate::record::{PostRecord, RawSubmission};
use anyhow::{Context, Result};
use std::collections::HashSet;

/// Outcome of a successful fetch. `Empty` means the archive answered and
/// matched nothing, which is distinct from a failed request (an `Err`).
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Empty,
    Records(Vec<PostRecord>),
}

impl Fetched {
    pub fn is_empty(&self) -> bool {
        match self {
            Fetched::Empty => true,
            Fetched::Records(v) => v.is_empty(),
        }
    }

    pub fn into_records(self) -> Vec<PostRecord> {
        match self {
            Fetched::Empty => Vec::new(),
            Fetched::Records(v) => v,
        }
    }
}

pub fn fetch_submissions<A: ArchiveClient + ?Sized>(archive: &A, query: &SubmissionQuery) -> Result<Fetched> {
    let query = query.clone().normalize();
    query.validate()?;

    let raw = collect_pages(archive, &query)
        .with_context(|| format!("searching r/{} in {}", query.subreddit_param(), query.window))?;

    if raw.is_empty() {
        tracing::warn!("Archive returned no submissions for r/{} in {}", query.subreddit_param(), query.window);
        return Ok(Fetched::Empty);
    }

    let received = raw.len();
    let mut records: Vec<PostRecord> = raw.into_iter().filter_map(PostRecord::from_raw).collect();
    if records.len() < received {
        tracing::warn!("Dropped {} submissions without id or created_utc", received - records.len());
    }

    records.retain(|r| query.window.contains(r.created_utc.unix_timestamp()));
    if let Some(min) = query.min_score {
        records.retain(|r| r.score >= min);
    }
    if let Some(min) = query.min_comments {
        records.retain(|r| r.num_comments >= min);
    }

    // stable: equal timestamps keep the archive's order
    records.sort_by_key(|r| r.created_utc);

    if let Some(min_len) = query.min_selftext_len {
        records.retain(|r| r.selftext_len() > min_len);
    }

    if records.is_empty() {
        tracing::warn!("All {} submissions were filtered out for r/{}", received, query.subreddit_param());
        return Ok(Fetched::Empty);
    }

    tracing::info!("Fetched {} submissions ({} received) for r/{}", records.len(), received, query.subreddit_param());
    Ok(Fetched::Records(records))
}

/// A `size` that fits in one response is a single top-by-score request.
/// Otherwise walk the window oldest-first, one archive page at a time, until
/// a short page comes back or `size` rows are collected.
///
/// The next page starts at the newest `created_utc` of the previous one, so
/// rows sharing that second are asked for again; repeats are dropped by id.
/// A full page made only of repeats moves the cursor one second on.
fn collect_pages<A: ArchiveClient + ?Sized>(archive: &A, query: &SubmissionQuery) -> Result<Vec<RawSubmission>> {
    if let Some(total) = query.single_page() {
        if total == 0 {
            return Ok(Vec::new());
        }
        let mut rows = archive.search_submissions(query)?;
        tracing::debug!("single page: {} received, top {} by score", rows.len(), total);
        rows.truncate(total);
        return Ok(rows);
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<RawSubmission> = Vec::new();
    let mut after = query.window.after;

    for page_no in 1usize.. {
        let want = match query.size {
            Some(total) => query.page_size.min(total.saturating_sub(out.len())),
            None => query.page_size,
        };
        if want == 0 || after >= query.window.before {
            break;
        }

        let page = archive
            .search_submissions(&query.page(after, want))
            .with_context(|| format!("page {page_no} from {}", TimeWindow::new(after, query.window.before)))?;
        let received = page.len();
        let newest = page.iter().filter_map(|r| r.created_utc).max();

        let mut fresh = 0usize;
        for raw in page {
            if let Some(id) = raw.id.as_deref() {
                if !seen.insert(id.to_string()) {
                    continue;
                }
            }
            out.push(raw);
            fresh += 1;
        }
        tracing::debug!("page {}: {} received, {} new, cursor {}", page_no, received, fresh, after);

        if received < want {
            break;
        }
        let Some(newest) = newest else { break };
        if fresh == 0 {
            if newest < after {
                tracing::warn!("page {} ignored the cursor at {}; stopping", page_no, after);
                break;
            }
            tracing::warn!("page {} repeated rows at {}; moving past that second", page_no, newest);
            after = newest.saturating_add(1);
        } else {
            after = newest.max(after);
        }
    }
    Ok(out)
}
