//! Mock object store for testing.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ObjectStore, ObjectStoreError, Result};

/// Mock object store that keeps objects in memory.
///
/// Every put attempt is logged, including failed ones, so tests can count
/// writes issued as well as writes that landed.
#[derive(Default)]
pub struct MockObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    attempts: RwLock<Vec<String>>,
    failing_keys: RwLock<HashSet<String>>,
    unavailable: RwLock<bool>,
    transient_failures: RwLock<usize>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write to `key` with a permanent error.
    pub async fn set_fail_on_key(&self, key: impl Into<String>) {
        self.failing_keys.write().await.insert(key.into());
    }

    pub async fn clear_failures(&self) {
        self.failing_keys.write().await.clear();
        *self.unavailable.write().await = false;
        *self.transient_failures.write().await = 0;
    }

    /// Fail every write with a transient outage.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Fail the next `count` writes with a throttling error.
    pub async fn fail_next_writes(&self, count: usize) {
        *self.transient_failures.write().await = count;
    }

    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of put attempts, successful or not.
    pub async fn attempt_count(&self) -> usize {
        self.attempts.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_object(&self, key: &str, body: &[u8]) -> Result<()> {
        self.attempts.write().await.push(key.to_string());

        if *self.unavailable.read().await {
            return Err(ObjectStoreError::Unavailable(
                "Mock object store outage".to_string(),
            ));
        }
        {
            let mut remaining = self.transient_failures.write().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ObjectStoreError::Throttled {
                    key: key.to_string(),
                    message: "Mock SlowDown".to_string(),
                });
            }
        }
        if self.failing_keys.read().await.contains(key) {
            return Err(ObjectStoreError::WriteFailed {
                key: key.to_string(),
                message: "Mock write failure".to_string(),
            });
        }

        self.objects
            .write()
            .await
            .insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("mock://{}", key)
    }
}
