use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, segments};

#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<()>;

    /// Stable retrieval URL for an uploaded object.
    async fn url(&self, path: &str) -> StoreResult<String>;

    /// Deleting a missing object succeeds.
    async fn delete(&self, path: &str) -> StoreResult<()>;

    async fn download(&self, path: &str) -> StoreResult<Option<Blob>>;
}

pub struct MemoryBlobStore {
    public_url: String,
    objects: RwLock<HashMap<String, Blob>>,
}

impl MemoryBlobStore {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    fn key(path: &str) -> StoreResult<String> {
        let segs = segments(path)?;
        if segs.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(segs.join("/"))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<()> {
        let key = Self::key(path)?;
        self.objects.write().await.insert(
            key,
            Blob {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(())
    }

    async fn url(&self, path: &str) -> StoreResult<String> {
        let key = Self::key(path)?;
        if !self.objects.read().await.contains_key(&key) {
            return Err(StoreError::Unavailable(format!("object `{key}` does not exist")));
        }
        Ok(format!("{}/{key}", self.public_url))
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        let key = Self::key(path)?;
        self.objects.write().await.remove(&key);
        Ok(())
    }

    async fn download(&self, path: &str) -> StoreResult<Option<Blob>> {
        let key = Self::key(path)?;
        Ok(self.objects.read().await.get(&key).cloned())
    }
}
