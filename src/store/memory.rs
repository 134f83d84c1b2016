use super::{Post, PostStore, StoredPost};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

/// In-process collection; contents are lost on shutdown.
pub struct MemoryStore {
    db_name: String,
    docs: RwLock<Vec<StoredPost>>,
}

impl MemoryStore {
    pub fn new(db_name: &str) -> Self {
        Self { db_name: db_name.to_string(), docs: RwLock::new(Vec::new()) }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    fn describe(&self) -> String {
        format!("memory://{}", self.db_name)
    }

    async fn insert(&self, post: Post) -> Result<StoredPost> {
        let stored = StoredPost::new(post);
        self.docs.write().push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, limit: usize) -> Result<Vec<StoredPost>> {
        Ok(self.docs.read().iter().take(limit).cloned().collect())
    }

    async fn find_by_post_id(&self, post_id: &str) -> Result<Option<StoredPost>> {
        Ok(self.docs.read().iter().find(|d| d.post.post_id == post_id).cloned())
    }

    async fn delete_by_post_id(&self, post_id: &str) -> Result<bool> {
        let mut docs = self.docs.write();
        match docs.iter().position(|d| d.post.post_id == post_id) {
            Some(i) => {
                docs.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
