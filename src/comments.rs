//! Comment aggregator: top comments of one post joined into a single string.

use crate::archive::ArchiveClient;
use crate::query::CommentQuery;
use anyhow::{Context, Result};

pub const COMMENT_SEPARATOR: &str = "...";

/// Join comment bodies with `"..."`, then keep at most `max_length`
/// characters. No ellipsis is appended on truncation.
pub fn join_comment_bodies<I, S>(bodies: I, max_length: Option<usize>) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (i, body) in bodies.into_iter().enumerate() {
        if i > 0 {
            joined.push_str(COMMENT_SEPARATOR);
        }
        joined.push_str(body.as_ref());
    }
    match max_length {
        Some(n) => truncate_chars(joined, n),
        None => joined,
    }
}

fn truncate_chars(s: String, n: usize) -> String {
    match s.char_indices().nth(n) {
        Some((cut, _)) => s[..cut].to_string(),
        None => s,
    }
}

/// Fetch up to `limit` comments under `post_id` (score descending) and join
/// their bodies. Comments without a body are skipped. Archive errors propagate.
pub fn aggregate_comments<A: ArchiveClient + ?Sized>(
    archive: &A,
    subreddit: &str,
    post_id: &str,
    limit: usize,
    max_length: Option<usize>,
) -> Result<String> {
    if limit == 0 {
        return Ok(String::new());
    }
    let query = CommentQuery::new(subreddit, post_id, limit);
    let comments = archive
        .search_comments(&query)
        .with_context(|| format!("fetching comments for post {post_id} in r/{subreddit}"))?;
    let bodies = comments.into_iter().take(limit).filter_map(|c| c.body);
    Ok(join_comment_bodies(bodies, max_length))
}
