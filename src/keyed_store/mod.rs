//! Keyed record store the seed writer inserts into.
//!
//! Table schema:
//! - `id`: partition key (String)
//! - `expirationTime`: TTL attribute (Number, epoch seconds)

#[cfg(feature = "dynamo")]
mod dynamo;
pub mod mock;

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoKeyedStore;
pub use mock::MockKeyedStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::change_event::Image;

/// Partition key attribute of the record table.
pub const PARTITION_KEY: &str = "id";
/// TTL attribute of the record table.
pub const TTL_ATTRIBUTE: &str = "expirationTime";
/// Table name of the reference deployment.
pub const DEFAULT_TABLE_NAME: &str = "dynamodb-archival-poc";

/// Errors that can occur during keyed store operations.
#[derive(Debug, Error)]
pub enum KeyedStoreError {
    #[error("Failed to write item: {0}")]
    WriteFailed(String),

    #[error("Keyed store throttled: {0}")]
    Throttled(String),

    #[error("Keyed store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

/// Result type for keyed store operations.
pub type Result<T> = std::result::Result<T, KeyedStoreError>;

/// Table of items addressed by [`PARTITION_KEY`].
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Create or replace the item. No condition is checked.
    async fn put_item(&self, item: &Image) -> Result<()>;

    fn table_name(&self) -> &str;
}
