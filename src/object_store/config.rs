//! Object store configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Object store type discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreType {
    /// Amazon S3 (requires `s3` feature).
    #[cfg(feature = "s3")]
    S3,
    /// One directory per bucket on the local filesystem.
    Filesystem,
}

impl Default for ObjectStoreType {
    #[cfg(feature = "s3")]
    fn default() -> Self {
        Self::S3
    }

    #[cfg(not(feature = "s3"))]
    fn default() -> Self {
        Self::Filesystem
    }
}

/// Configuration for the archive destination.
///
/// The bucket itself comes from `BUCKET_NAME`; this section only chooses and
/// tunes the backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Backend type.
    #[serde(rename = "type")]
    pub store_type: ObjectStoreType,
    /// Optional key prefix; keys become `{prefix}/record-{id}`.
    pub prefix: Option<String>,
    /// AWS region. Uses the default provider chain if not set.
    pub region: Option<String>,
    /// Custom endpoint URL (LocalStack, MinIO).
    pub endpoint: Option<String>,
    /// Filesystem backend configuration.
    pub filesystem: FilesystemStoreConfig,
}

/// Filesystem object store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesystemStoreConfig {
    /// Root directory. Objects land in `{base_path}/{bucket}/{key}`.
    pub base_path: PathBuf,
}

impl Default for FilesystemStoreConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./data/archive"),
        }
    }
}
