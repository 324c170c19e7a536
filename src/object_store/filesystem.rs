//! Filesystem-based object store.
//!
//! Stores objects as files under a base directory, one file per key:
//! ```text
//! {base_path}/
//!   record-{id}
//!   {prefix}/record-{id}
//! ```

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::{ObjectStore, ObjectStoreError, Result};

/// Filesystem-based object store.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    ///
    /// Creates the base directory if it doesn't exist.
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    /// Resolve a key to a path inside the base directory.
    fn path_for_key(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let contained = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put_object(&self, key: &str, body: &[u8]) -> Result<()> {
        let path = self.path_for_key(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically using a per-write temp file + rename
        let mut temp_path = path.clone().into_os_string();
        temp_path.push(format!(".{}.tmp", Uuid::new_v4()));
        let temp_path = PathBuf::from(temp_path);
        fs::write(&temp_path, body).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(path = %path.display(), size = body.len(), "Stored object");
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("file://{}", self.base_path.join(key).display())
    }
}
