//! archival-processor: archives removed items to the object store
//!
//! Subscribed to both delivery paths of the record table:
//! ```text
//! [DynamoDB Streams] --(TTL filter, batch 1)------> [archival-processor] --> [S3]
//! [Kinesis relay]    --(unfiltered, batch 100)--->
//! ```
//!
//! ## Configuration
//! - BUCKET_NAME: Destination bucket (required, checked at cold start)
//! - ARCHIVAL_CONFIG: Optional YAML config file (default: archival.yaml)
//! - ARCHIVAL__OBJECT_STORE__ENDPOINT: Custom S3 endpoint (LocalStack, MinIO)
//! - ARCHIVAL_LOG: Log filter (default: info)

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::{error, info, Instrument};

use ttl_archival::archive::{ArchivalProcessor, BatchReport};
use ttl_archival::config::ArchiverConfig;
use ttl_archival::object_store::init_object_store;
use ttl_archival::relay::StreamBatch;

async fn handle(processor: &ArchivalProcessor, event: LambdaEvent<StreamBatch>) -> Result<BatchReport, Error> {
    let (batch, context) = event.into_parts();
    let span = tracing::info_span!("invocation", request_id = %context.request_id);

    processor
        .process_batch(batch)
        .instrument(span)
        .await
        .map_err(Into::into)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    ttl_archival::utils::bootstrap::init_tracing();

    let config = ArchiverConfig::load(None).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    let bucket = config.bucket()?;

    let store = init_object_store(bucket, &config.object_store).await?;
    let processor = ArchivalProcessor::new(store, config.processor_options());

    info!(
        bucket = %bucket,
        invalid_records = ?config.invalid_records,
        relay_expiry_only = config.relay_expiry_only,
        "Starting archival-processor"
    );

    run(service_fn(|event: LambdaEvent<StreamBatch>| handle(&processor, event))).await
}
