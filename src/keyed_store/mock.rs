//! Mock keyed store for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyedStore, KeyedStoreError, Result, DEFAULT_TABLE_NAME, PARTITION_KEY};
use crate::change_event::{AttributeValue, Image};

/// Mock keyed store that stores items in memory, keyed by `id`.
pub struct MockKeyedStore {
    table_name: String,
    items: RwLock<HashMap<String, Image>>,
    put_count: RwLock<usize>,
    fail_on_put: RwLock<bool>,
}

impl Default for MockKeyedStore {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            items: RwLock::default(),
            put_count: RwLock::default(),
            fail_on_put: RwLock::default(),
        }
    }
}

impl MockKeyedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    pub async fn item(&self, id: &str) -> Option<Image> {
        self.items.read().await.get(id).cloned()
    }

    pub async fn item_count(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn put_count(&self) -> usize {
        *self.put_count.read().await
    }

    /// Remove an item, returning its last image. Stands in for a TTL sweep.
    pub async fn expire(&self, id: &str) -> Option<Image> {
        self.items.write().await.remove(id)
    }
}

#[async_trait]
impl KeyedStore for MockKeyedStore {
    async fn put_item(&self, item: &Image) -> Result<()> {
        *self.put_count.write().await += 1;

        if *self.fail_on_put.read().await {
            return Err(KeyedStoreError::Unavailable(
                "Mock put failure".to_string(),
            ));
        }

        let id = match item.get(PARTITION_KEY) {
            Some(AttributeValue::String(id)) => id.clone(),
            _ => {
                return Err(KeyedStoreError::InvalidItem(format!(
                    "item has no string {} attribute",
                    PARTITION_KEY
                )))
            }
        };

        self.items.write().await.insert(id, item.clone());
        Ok(())
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }
}
