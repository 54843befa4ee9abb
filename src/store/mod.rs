//! Contracts for the remote backend the app talks to: a path-addressed
//! document tree and a blob store.
//!
//! Paths look like `users/{uid}/cart/{key}`. Writing `null` (or a tombstone
//! in a [`Patch`]) removes the node, and empty objects never survive a write.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub mod blob;
pub mod memory;
pub mod paths;
pub mod watch;

pub use blob::{BlobStore, MemoryBlobStore};
pub use memory::MemoryStore;
pub use watch::{FromSnapshot, Subscription, Watch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid path `{0}`")]
    InvalidPath(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed document at `{path}`: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A multi-path partial update. Each key is an absolute path; `None` deletes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    entries: BTreeMap<String, Option<Value>>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, value: Value) -> Self {
        self.entries.insert(path.into(), Some(value));
        self
    }

    pub fn set_json<T: Serialize>(self, path: impl Into<String>, value: &T) -> StoreResult<Self> {
        Ok(self.set(path, serde_json::to_value(value)?))
    }

    pub fn delete(mut self, path: impl Into<String>) -> Self {
        self.entries.insert(path.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Full replace of the node at `path`.
    async fn write(&self, path: &str, value: Value) -> StoreResult<()>;

    async fn update(&self, patch: Patch) -> StoreResult<()>;

    async fn remove(&self, path: &str) -> StoreResult<()> {
        self.update(Patch::new().delete(path)).await
    }

    async fn subscribe(&self, path: &str) -> StoreResult<Subscription>;

    /// Store-generated child key, chronologically ordered.
    fn push_key(&self) -> String {
        next_push_key()
    }

    /// Whether a multi-path [`Patch`] lands all-or-nothing.
    fn atomic_updates(&self) -> bool {
        true
    }
}

pub async fn get<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &str,
) -> StoreResult<Option<T>> {
    match store.read(path).await? {
        Some(value) => decode(path, value).map(Some),
        None => Ok(None),
    }
}

pub async fn put<T: Serialize>(store: &dyn DocumentStore, path: &str, value: &T) -> StoreResult<()> {
    store.write(path, serde_json::to_value(value)?).await
}

pub fn decode<T: DeserializeOwned>(path: &str, value: Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|source| StoreError::Malformed {
        path: path.to_string(),
        source,
    })
}

/// Split a path into segments, rejecting characters the backend forbids.
pub fn segments(path: &str) -> StoreResult<Vec<&str>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let segs: Vec<&str> = trimmed.split('/').collect();
    let bad = segs.iter().any(|s| {
        s.is_empty() || s.contains(['.', '#', '$', '[', ']'])
    });
    if bad {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segs)
}

static PUSH_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_push_key() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let seq = PUSH_SEQ.fetch_add(1, Ordering::Relaxed) & 0xff_ffff;
    let salt = Uuid::new_v4().simple().to_string();
    format!("{millis:012x}{seq:06x}{}", &salt[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_rejects_forbidden_characters() {
        assert!(segments("users/a.b/cart").is_err());
        assert!(segments("users//cart").is_err());
        assert_eq!(segments("/users/u1/cart/").unwrap(), vec!["users", "u1", "cart"]);
        assert!(segments("").unwrap().is_empty());
    }

    #[test]
    fn push_keys_are_unique_and_ordered() {
        let a = next_push_key();
        let b = next_push_key();
        assert_ne!(a, b);
        assert!(a[..18] < b[..18]);
        assert_eq!(a.len(), 24);
    }
}
