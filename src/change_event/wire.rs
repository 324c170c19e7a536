//! Wire shapes of a DynamoDB stream record.
//!
//! The same document arrives directly from DynamoDB Streams and, base64
//! wrapped, inside Kinesis relay records. Every field is optional here;
//! [`ChangeEvent`](super::ChangeEvent) decides what is required.

use serde::{Deserialize, Serialize};

use super::Image;

/// One change record as delivered by the stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
    #[serde(
        rename = "eventSourceARN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_source_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    /// Only present in the Kinesis streaming destination format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_identity: Option<UserIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamodb: Option<StreamPayload>,
}

/// Principal that caused the change. Present for TTL removals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    #[serde(rename = "type")]
    pub principal_type: String,
    pub principal_id: String,
}

/// The `dynamodb` section: keys, images and stream position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_view_type: Option<String>,
    /// Seconds on DynamoDB Streams, milliseconds on the Kinesis destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_creation_date_time: Option<f64>,
}
