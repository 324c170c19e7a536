//! Kinesis relay records.
//!
//! The table's Kinesis streaming destination wraps each change record as
//! base64 JSON in `kinesis.data`:
//! ```text
//! {"eventSource": "aws:kinesis", "kinesis": {"partitionKey": "..", "data": "eyJhd3NSZWdpb24iOi..."}}
//! ```

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::change_event::{StreamRecord, ValidationError};

/// Outer Kinesis event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisRecord {
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub kinesis: KinesisPayload,
}

/// The `kinesis` section of a relay record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
    /// Base64 encoded change record.
    pub data: String,
}

impl KinesisRecord {
    /// Decode the wrapped change record.
    pub fn change_record(&self) -> Result<StreamRecord, ValidationError> {
        let bytes = BASE64_STANDARD.decode(self.kinesis.data.trim()).map_err(|e| {
            ValidationError::MalformedRecord(format!("kinesis data is not base64: {}", e))
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            ValidationError::MalformedRecord(format!("kinesis data is not a change record: {}", e))
        })
    }

    /// Wrap a change record the way the streaming destination does.
    pub fn wrap(record: &StreamRecord, partition_key: impl Into<String>) -> serde_json::Result<Self> {
        let data = BASE64_STANDARD.encode(serde_json::to_vec(record)?);
        Ok(Self {
            event_id: None,
            kinesis: KinesisPayload {
                partition_key: Some(partition_key.into()),
                sequence_number: None,
                data,
            },
        })
    }
}
