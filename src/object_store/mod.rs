//! Object storage for archived records.
//!
//! Archived records are written as whole objects under a key; a write to an
//! existing key replaces it. That overwrite semantics is what makes
//! redelivered batches safe to process again.
//!
//! ## Backends
//!
//! - `S3ObjectStore` (feature: s3) - Amazon S3, the deployed destination
//! - `FilesystemObjectStore` - a directory per bucket, for local runs
//! - `MockObjectStore` - in memory with failure injection, for tests

mod config;
mod filesystem;
pub mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use config::{FilesystemStoreConfig, ObjectStoreConfig, ObjectStoreType};
pub use filesystem::FilesystemObjectStore;
pub use mock::MockObjectStore;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Failed to write object {key}: {message}")]
    WriteFailed { key: String, message: String },

    #[error("Object store throttled write of {key}: {message}")]
    Throttled { key: String, message: String },

    #[error("Object store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ObjectStoreError {
    /// Whether repeating the same write may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Throttled { .. } | Self::Unavailable(_) | Self::Io(_)
        )
    }
}

/// Result type for object store operations.
pub type Result<T> = std::result::Result<T, ObjectStoreError>;

/// Destination for archived records.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create or replace the object at `key`.
    async fn put_object(&self, key: &str, body: &[u8]) -> Result<()>;

    /// Human-readable location of `key`, for logs.
    fn location(&self, key: &str) -> String;
}

// ============================================================================
// Factory
// ============================================================================

/// Initialize the object store named by configuration.
///
/// # Errors
///
/// Returns error if the backend cannot be constructed.
pub async fn init_object_store(
    bucket: &str,
    config: &ObjectStoreConfig,
) -> std::result::Result<Arc<dyn ObjectStore>, Box<dyn std::error::Error + Send + Sync>> {
    use tracing::info;

    match config.store_type {
        ObjectStoreType::Filesystem => {
            info!(
                path = %config.filesystem.base_path.display(),
                bucket = %bucket,
                "ObjectStore: filesystem"
            );
            let store = FilesystemObjectStore::new(config.filesystem.base_path.join(bucket)).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "s3")]
        ObjectStoreType::S3 => {
            info!(
                bucket = %bucket,
                region = ?config.region,
                endpoint = ?config.endpoint,
                "ObjectStore: s3"
            );
            let store = match &config.endpoint {
                Some(endpoint) => {
                    S3ObjectStore::with_endpoint(bucket, endpoint, config.region.as_deref()).await
                }
                None => S3ObjectStore::new(bucket, config.region.as_deref()).await,
            };
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_transient_classification() {
        assert!(ObjectStoreError::Unavailable("down".into()).is_transient());
        assert!(ObjectStoreError::Throttled {
            key: "k".into(),
            message: "SlowDown".into()
        }
        .is_transient());
        assert!(!ObjectStoreError::WriteFailed {
            key: "k".into(),
            message: "AccessDenied".into()
        }
        .is_transient());
        assert!(!ObjectStoreError::InvalidKey("../x".into()).is_transient());
    }

    #[tokio::test]
    async fn test_init_filesystem_store_writes_under_bucket_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = ObjectStoreConfig {
            store_type: ObjectStoreType::Filesystem,
            filesystem: FilesystemStoreConfig {
                base_path: temp_dir.path().to_path_buf(),
            },
            ..Default::default()
        };

        let store = init_object_store("archive-bucket", &config).await.unwrap();
        store.put_object("record-abc", b"{}").await.unwrap();

        let written = temp_dir.path().join("archive-bucket").join("record-abc");
        assert_eq!(std::fs::read(written).unwrap(), b"{}");
    }
}
