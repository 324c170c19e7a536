//! DynamoDB KeyedStore implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue as SdkAttributeValue;
use aws_sdk_dynamodb::Client;
use base64::prelude::*;
use tracing::{debug, info};

use super::{KeyedStore, KeyedStoreError, Result};
use crate::change_event::{AttributeValue, Image};

/// Error codes DynamoDB returns for load it expects the caller to retry.
const THROTTLING_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "ThrottlingException",
    "RequestLimitExceeded",
];

/// DynamoDB implementation of KeyedStore.
pub struct DynamoKeyedStore {
    client: Client,
    table_name: String,
}

impl DynamoKeyedStore {
    /// Create a new DynamoDB keyed store.
    pub async fn new(
        table_name: impl Into<String>,
        endpoint_url: Option<&str>,
        region: Option<&str>,
    ) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = config_loader.load().await;

        let client = if let Some(endpoint) = endpoint_url {
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        } else {
            Client::new(&config)
        };

        let table_name = table_name.into();
        info!(table = %table_name, "Connected to DynamoDB for records");

        Self { client, table_name }
    }

    /// Create with explicit client.
    pub fn with_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn decode_binary(encoded: &str) -> Result<Blob> {
    BASE64_STANDARD
        .decode(encoded)
        .map(Blob::new)
        .map_err(|e| KeyedStoreError::InvalidItem(format!("binary attribute is not base64: {}", e)))
}

/// Convert a typed value to the SDK representation.
fn to_sdk(value: &AttributeValue) -> Result<SdkAttributeValue> {
    Ok(match value {
        AttributeValue::String(s) => SdkAttributeValue::S(s.clone()),
        AttributeValue::Number(n) => SdkAttributeValue::N(n.clone()),
        AttributeValue::Binary(b) => SdkAttributeValue::B(decode_binary(b)?),
        AttributeValue::Bool(b) => SdkAttributeValue::Bool(*b),
        AttributeValue::Null(b) => SdkAttributeValue::Null(*b),
        AttributeValue::List(items) => {
            SdkAttributeValue::L(items.iter().map(to_sdk).collect::<Result<Vec<_>>>()?)
        }
        AttributeValue::Map(image) => SdkAttributeValue::M(to_sdk_item(image)?),
        AttributeValue::StringSet(items) => SdkAttributeValue::Ss(items.clone()),
        AttributeValue::NumberSet(items) => SdkAttributeValue::Ns(items.clone()),
        AttributeValue::BinarySet(items) => SdkAttributeValue::Bs(
            items
                .iter()
                .map(|b| decode_binary(b))
                .collect::<Result<Vec<_>>>()?,
        ),
    })
}

fn to_sdk_item(image: &Image) -> Result<HashMap<String, SdkAttributeValue>> {
    image
        .iter()
        .map(|(name, value)| Ok((name.to_string(), to_sdk(value)?)))
        .collect()
}

fn classify<E, R>(err: SdkError<E, R>) -> KeyedStoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            KeyedStoreError::Unavailable(message)
        }
        _ if err.code().is_some_and(|code| THROTTLING_CODES.contains(&code)) => {
            KeyedStoreError::Throttled(message)
        }
        _ => KeyedStoreError::WriteFailed(message),
    }
}

#[async_trait]
impl KeyedStore for DynamoKeyedStore {
    async fn put_item(&self, item: &Image) -> Result<()> {
        let sdk_item = to_sdk_item(item)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(sdk_item))
            .send()
            .await
            .map_err(classify)?;

        debug!(
            table = %self.table_name,
            attributes = item.len(),
            "Stored item in DynamoDB"
        );
        Ok(())
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }
}
