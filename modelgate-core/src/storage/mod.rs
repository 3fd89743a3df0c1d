//! Object storage seam for large-media offload
//!
//! The gateway only needs "put object, get reference" from its storage
//! collaborator; the actual backend lives outside this crate. The in-memory
//! implementation backs tests and makes the offload path observable.

use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A stored object: the provider-facing reference and a caller-facing URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Reference forwarded to providers (e.g. `s3://bucket/key`)
    pub reference: String,

    /// Download URL handed back to callers
    pub url: String,
}

/// Storage collaborator interface
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` and return its reference.
    async fn put(&self, bytes: Vec<u8>, content_type: &str, key: &str)
        -> ProviderResult<StoredObject>;

    /// Fetch an object back by reference.
    async fn get(&self, reference: &str) -> ProviderResult<Vec<u8>>;
}

/// In-memory store used by tests and local runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(HashMap::new()),
            puts: AtomicUsize::new(0),
        }
    }

    /// Number of `put` calls observed, used to assert offload behavior.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn reference(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        bytes: Vec<u8>,
        _content_type: &str,
        key: &str,
    ) -> ProviderResult<StoredObject> {
        let reference = self.reference(key);
        self.objects
            .lock()
            .map_err(|_| ProviderError::Storage("store lock poisoned".to_string()))?
            .insert(reference.clone(), bytes);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(StoredObject {
            url: format!("https://{}.storage.local/{}", self.bucket, key),
            reference,
        })
    }

    async fn get(&self, reference: &str) -> ProviderResult<Vec<u8>> {
        self.objects
            .lock()
            .map_err(|_| ProviderError::Storage("store lock poisoned".to_string()))?
            .get(reference)
            .cloned()
            .ok_or_else(|| ProviderError::Storage(format!("object not found: {reference}")))
    }
}
