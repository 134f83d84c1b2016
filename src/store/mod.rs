//! Document store for posts served by the CRUD API.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod file;
pub mod memory;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Name of the collection holding posts.
pub const COLLECTION: &str = "posts";

/// Upper bound on documents returned by a list.
pub const LIST_LIMIT: usize = 100;

// ============================================================================
// Documents
// ============================================================================

/// The post schema accepted and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub title: String,
    pub subreddit: String,
    pub author: String,
    #[serde(with = "crate::date::api_datetime")]
    pub created_utc: OffsetDateTime,
    pub domain: String,
    pub url: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub num_comments: i64,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub score: i64,
    pub url_content: String,
}

/// A post as persisted: the payload plus the store-assigned `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPost {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub post: Post,
}

impl StoredPost {
    pub fn new(post: Post) -> Self {
        Self { id: Uuid::new_v4(), post }
    }
}

/// Counts sometimes arrive quoted (`"10"`); accept both forms.
fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrText {
        Int(i64),
        Text(String),
    }
    match IntOrText::deserialize(d)? {
        IntOrText::Int(v) => Ok(v),
        IntOrText::Text(s) => s.trim().parse().map_err(|_| serde::de::Error::custom(format!("invalid integer {s:?}"))),
    }
}

// ============================================================================
// PostStore trait
// ============================================================================

/// One collection of posts. Each method is a single store operation; the
/// implementation owns its locking.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    async fn insert(&self, post: Post) -> Result<StoredPost>;

    /// Up to `limit` documents in store order.
    async fn list(&self, limit: usize) -> Result<Vec<StoredPost>>;

    /// First document whose `post_id` matches.
    async fn find_by_post_id(&self, post_id: &str) -> Result<Option<StoredPost>>;

    /// Remove the first document whose `post_id` matches; `false` if none did.
    async fn delete_by_post_id(&self, post_id: &str) -> Result<bool>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Open the store named by a connection string:
/// - `memory://` keeps documents in process
/// - `file:///some/dir` keeps `<dir>/<db_name>/posts.ndjson`
pub async fn open_store(uri: &str, db_name: &str) -> Result<Arc<dyn PostStore>> {
    let db_name = db_name.trim();
    if db_name.is_empty() || db_name.contains(['/', '\\']) || db_name == ".." {
        bail!("invalid database name {db_name:?}");
    }
    let uri = uri.trim();
    if uri == "memory://" || uri == "memory:" {
        return Ok(Arc::new(MemoryStore::new(db_name)));
    }
    if let Some(rest) = uri.strip_prefix("file://") {
        if rest.is_empty() {
            bail!("file:// store needs a directory");
        }
        let path = PathBuf::from(rest).join(db_name).join(format!("{COLLECTION}.ndjson"));
        return Ok(Arc::new(FileStore::open(path).await?));
    }
    bail!("unsupported store URI {uri:?}; expected memory:// or file:///path")
}
