//! Seed writer: inserts one short-lived item into the record table.
//!
//! The item expires `ttl_seconds` after insertion, which sends it through
//! the TTL sweep, the change feed and finally the archival processor.

mod clock;

pub use clock::{Clock, IdGenerator, SystemClock, UuidGenerator};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::change_event::{AttributeValue, Image};
use crate::config::SeedConfig;
use crate::error::Result;
use crate::keyed_store::{KeyedStore, PARTITION_KEY, TTL_ATTRIBUTE};

/// Item inserted by the seed writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedItem {
    pub id: String,
    pub name: String,
    /// Epoch seconds.
    pub expiration_time: i64,
}

impl SeedItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            id: id.into(),
            name: name.into(),
            expiration_time: now.timestamp().saturating_add(ttl_secs),
        }
    }

    /// Table representation: `id`, `name`, `expirationTime`, in that order.
    pub fn to_image(&self) -> Image {
        Image::new()
            .with(PARTITION_KEY, AttributeValue::String(self.id.clone()))
            .with("name", AttributeValue::String(self.name.clone()))
            .with(TTL_ATTRIBUTE, AttributeValue::number(self.expiration_time))
    }
}

/// HTTP-shaped handler result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl SeedResponse {
    pub fn success() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code: 200,
            headers,
            body: serde_json::json!({ "status": "success" }).to_string(),
        }
    }
}

/// Writes seed items to a keyed store.
pub struct SeedWriter {
    store: Arc<dyn KeyedStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    item_name: String,
    ttl: Duration,
}

impl SeedWriter {
    /// Writer using the system clock and random UUIDs.
    pub fn new(store: Arc<dyn KeyedStore>, config: &SeedConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            item_name: config.item_name.clone(),
            ttl: config.ttl(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Build the next item without writing it.
    pub fn next_item(&self) -> SeedItem {
        SeedItem::new(self.ids.next_id(), &self.item_name, self.clock.now(), self.ttl)
    }

    /// Insert one item. An existing item with the same id is replaced.
    pub async fn seed(&self) -> Result<SeedItem> {
        let item = self.next_item();

        if let Err(e) = self.store.put_item(&item.to_image()).await {
            error!(
                table = %self.store.table_name(),
                id = %item.id,
                error = %e,
                "Error adding item to table"
            );
            return Err(e.into());
        }

        info!(
            table = %self.store.table_name(),
            id = %item.id,
            expiration_time = item.expiration_time,
            "Item successfully added to table"
        );
        Ok(item)
    }

    /// Handler entry point.
    pub async fn handle(&self) -> Result<SeedResponse> {
        self.seed().await?;
        Ok(SeedResponse::success())
    }
}
