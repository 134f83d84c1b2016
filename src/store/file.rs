use super::{Post, PostStore, StoredPost};
use crate::ndjson::{read_documents, write_documents_atomic};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Collection persisted as one NDJSON file. Documents live in memory; every
/// mutation rewrites the file before it becomes visible, and the lock is held
/// across the write so mutations are applied in order.
pub struct FileStore {
    path: PathBuf,
    docs: Mutex<Vec<StoredPost>>,
}

impl FileStore {
    pub async fn open(path: PathBuf) -> Result<Self> {
        let p = path.clone();
        let docs = tokio::task::spawn_blocking(move || read_documents::<StoredPost>(&p))
            .await
            .context("store loader task failed")??;
        tracing::info!("Loaded {} posts from {}", docs.len(), path.display());
        Ok(Self { path, docs: Mutex::new(docs) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, docs: Vec<StoredPost>) -> Result<Vec<StoredPost>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_documents_atomic(&path, &docs).map(|_| docs))
            .await
            .context("store writer task failed")?
    }
}

#[async_trait]
impl PostStore for FileStore {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    async fn insert(&self, post: Post) -> Result<StoredPost> {
        let mut guard = self.docs.lock().await;
        let stored = StoredPost::new(post);
        let mut next = guard.clone();
        next.push(stored.clone());
        *guard = self.persist(next).await?;
        Ok(stored)
    }

    async fn list(&self, limit: usize) -> Result<Vec<StoredPost>> {
        Ok(self.docs.lock().await.iter().take(limit).cloned().collect())
    }

    async fn find_by_post_id(&self, post_id: &str) -> Result<Option<StoredPost>> {
        Ok(self.docs.lock().await.iter().find(|d| d.post.post_id == post_id).cloned())
    }

    async fn delete_by_post_id(&self, post_id: &str) -> Result<bool> {
        let mut guard = self.docs.lock().await;
        let Some(i) = guard.iter().position(|d| d.post.post_id == post_id) else {
            return Ok(false);
        };
        let mut next = guard.clone();
        next.remove(i);
        *guard = self.persist(next).await?;
        Ok(true)
    }

    async fn close(&self) -> Result<()> {
        let docs = self.docs.lock().await;
        tracing::info!("Closing {} ({} posts)", self.path.display(), docs.len());
        Ok(())
    }
}
