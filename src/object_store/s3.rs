//! Amazon S3 object store.
//!
//! Writes archived records as plain objects:
//! ```text
//! s3://{bucket}/{key}
//! ```

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{ObjectStore, ObjectStoreError, Result};

/// Error codes S3 returns for load it expects the caller to retry.
const TRANSIENT_CODES: &[&str] = &[
    "SlowDown",
    "ServiceUnavailable",
    "InternalError",
    "RequestTimeout",
    "ThrottlingException",
];

/// S3-based object store.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a new S3 object store.
    ///
    /// Uses default credentials from the environment (AWS_ACCESS_KEY_ID,
    /// AWS_SECRET_ACCESS_KEY, or the Lambda execution role).
    pub async fn new(bucket: impl Into<String>, region: Option<&str>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = config_loader.load().await;

        Self::with_client(Client::new(&config), bucket)
    }

    /// Create with custom endpoint (LocalStack, MinIO).
    pub async fn with_endpoint(
        bucket: impl Into<String>,
        endpoint: &str,
        region: Option<&str>,
    ) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = config_loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .endpoint_url(endpoint)
            .force_path_style(true) // Required for MinIO and most S3-compatible services
            .build();

        Self::with_client(Client::from_conf(s3_config), bucket)
    }

    /// Create with explicit client.
    pub fn with_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

fn classify<E, R>(key: &str, err: SdkError<E, R>) -> ObjectStoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ObjectStoreError::Unavailable(message)
        }
        _ if err.code().is_some_and(|code| TRANSIENT_CODES.contains(&code)) => {
            ObjectStoreError::Throttled {
                key: key.to_string(),
                message,
            }
        }
        _ => ObjectStoreError::WriteFailed {
            key: key.to_string(),
            message,
        },
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body.to_vec()))
            .send()
            .await
            .map_err(|e| classify(key, e))?;

        debug!(
            bucket = %self.bucket,
            key = %key,
            size = body.len(),
            "Stored object in S3"
        );
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}
