//! Row types: archive payloads as they arrive, the ten-column post record,
//! and the enriched twelve-column row written by the batch enricher.

use crate::query::POST_COLUMNS;
use serde::Deserialize;
use time::OffsetDateTime;

/// Column order of enriched output: the post columns, then the two enrichment fields.
pub const ENRICHED_COLUMNS: [&str; 12] = [
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
    "comments",
    "url_content",
];

/// A submission as returned by the archive. Every field is optional because
/// the `filter` parameter trims the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubmission {
    pub id: Option<String>,
    pub subreddit: Option<String>,
    pub author: Option<String>,
    #[serde(default, deserialize_with = "crate::date::epoch_seconds::deserialize")]
    pub created_utc: Option<i64>,
    pub domain: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub num_comments: Option<i64>,
    pub selftext: Option<String>,
    pub score: Option<i64>,
}

/// A comment reduced to author and body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawComment {
    pub author: Option<String>,
    pub body: Option<String>,
}

/// One fetched submission. Immutable once built; enrichment wraps it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub subreddit: String,
    pub author: String,
    #[serde(deserialize_with = "crate::date::csv_datetime::deserialize")]
    pub created_utc: OffsetDateTime,
    pub domain: String,
    pub url: String,
    pub title: String,
    pub num_comments: i64,
    pub selftext: Option<String>,
    pub score: i64,
}

impl PostRecord {
    /// Build from an archive payload. Rows without an id or a usable
    /// creation time cannot be placed in the output and yield `None`.
    pub fn from_raw(raw: RawSubmission) -> Option<Self> {
        let id = raw.id.filter(|s| !s.trim().is_empty())?;
        let created_utc = OffsetDateTime::from_unix_timestamp(raw.created_utc?).ok()?;
        Some(Self {
            id,
            subreddit: raw.subreddit.unwrap_or_default(),
            author: raw.author.unwrap_or_default(),
            created_utc,
            domain: raw.domain.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            num_comments: raw.num_comments.unwrap_or(0),
            selftext: raw.selftext,
            score: raw.score.unwrap_or(0),
        })
    }

    /// Self-text length in characters (0 when absent).
    pub fn selftext_len(&self) -> usize {
        self.selftext.as_deref().map(|s| s.chars().count()).unwrap_or(0)
    }

    /// CSV cell for a named column, or `None` for an unknown name.
    pub fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "id" => self.id.clone(),
            "subreddit" => self.subreddit.clone(),
            "author" => self.author.clone(),
            "created_utc" => crate::date::format_csv(self.created_utc),
            "domain" => self.domain.clone(),
            "url" => self.url.clone(),
            "title" => self.title.clone(),
            "num_comments" => self.num_comments.to_string(),
            "selftext" => self.selftext.clone().unwrap_or_default(),
            "score" => self.score.to_string(),
            _ => return None,
        })
    }

    pub fn to_row(&self) -> Vec<String> {
        POST_COLUMNS.iter().filter_map(|c| self.field(c)).collect()
    }
}

/// A post plus its joined top comments and scraped article text.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPost {
    pub post: PostRecord,
    pub comments: String,
    pub url_content: String,
}

impl EnrichedPost {
    pub fn to_row(&self) -> Vec<String> {
        let mut row = self.post.to_row();
        row.push(self.comments.clone());
        row.push(self.url_content.clone());
        row
    }
}
