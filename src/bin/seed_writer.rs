//! seed-writer: inserts one expiring item per invocation
//!
//! The payload is ignored. Each call writes
//! `{id: <uuid>, name: "item", expirationTime: now + ttl}` and answers with an
//! HTTP-shaped success document.
//!
//! ## Configuration
//! - TABLE_NAME: Record table (default: dynamodb-archival-poc)
//! - ARCHIVAL_CONFIG: Optional YAML config file (default: archival.yaml)
//! - ARCHIVAL__TTL_SECONDS: Item lifetime (default: 3600)
//! - ARCHIVAL__ENDPOINT: Custom DynamoDB endpoint (DynamoDB Local)
//! - ARCHIVAL_LOG: Log filter (default: info)

use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, Instrument};

use ttl_archival::config::SeedConfig;
use ttl_archival::keyed_store::DynamoKeyedStore;
use ttl_archival::seed::{SeedResponse, SeedWriter};

async fn handle(writer: &SeedWriter, event: LambdaEvent<Value>) -> Result<SeedResponse, Error> {
    let span = tracing::info_span!("invocation", request_id = %event.context.request_id);

    writer.handle().instrument(span).await.map_err(Into::into)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    ttl_archival::utils::bootstrap::init_tracing();

    let config = SeedConfig::load(None).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let store = DynamoKeyedStore::new(
        config.table_name.clone(),
        config.endpoint.as_deref(),
        config.region.as_deref(),
    )
    .await;
    let writer = SeedWriter::new(Arc::new(store), &config);

    info!(
        table = %config.table_name,
        ttl_seconds = config.ttl_seconds,
        "Starting seed-writer"
    );

    run(service_fn(|event: LambdaEvent<Value>| handle(&writer, event))).await
}
