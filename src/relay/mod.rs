//! Delivery batches from the two event sources.
//!
//! A Lambda invocation carries `{"Records": [...]}` from either DynamoDB
//! Streams (the change feed) or Kinesis (the relay). Records are kept as raw
//! JSON until [`decode_record`] validates them one at a time, so a single bad
//! record is reported on its own instead of failing deserialization of the
//! whole batch.

mod filter;
mod kinesis;

pub use filter::{EventFilter, StartingPosition, Trigger, RELAY_BATCH_SIZE};
pub use kinesis::{KinesisPayload, KinesisRecord};

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::change_event::{ChangeEvent, StreamRecord, ValidationError};

/// `eventSource` of DynamoDB Streams records.
pub const DYNAMODB_EVENT_SOURCE: &str = "aws:dynamodb";
/// `eventSource` of Kinesis records.
pub const KINESIS_EVENT_SOURCE: &str = "aws:kinesis";

/// Which path delivered a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// DynamoDB Streams, filtered server side.
    ChangeFeed,
    /// Kinesis, unfiltered.
    Relay,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeFeed => f.write_str("change_feed"),
            Self::Relay => f.write_str("relay"),
        }
    }
}

/// One invocation's worth of records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<Value>,
}

impl StreamBatch {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A record that passed validation, tagged with its delivery path.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub source: RecordSource,
    pub event: ChangeEvent,
}

/// Identify the delivery path of a raw record and validate it.
pub fn decode_record(raw: &Value) -> Result<InboundEvent, ValidationError> {
    let event_source = raw
        .get("eventSource")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::MalformedRecord("record has no eventSource".to_string()))?;

    let (source, record) = match event_source {
        DYNAMODB_EVENT_SOURCE => {
            let record: StreamRecord = serde_json::from_value(raw.clone())
                .map_err(|e| ValidationError::MalformedRecord(e.to_string()))?;
            (RecordSource::ChangeFeed, record)
        }
        KINESIS_EVENT_SOURCE => {
            let outer: KinesisRecord = serde_json::from_value(raw.clone())
                .map_err(|e| ValidationError::MalformedRecord(e.to_string()))?;
            (RecordSource::Relay, outer.change_record()?)
        }
        other => return Err(ValidationError::UnknownEventSource(other.to_string())),
    };

    Ok(InboundEvent {
        source,
        event: ChangeEvent::try_from(record)?,
    })
}
