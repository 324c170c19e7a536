//! Test utilities: record builders and deterministic sources.
//!
//! Builders produce raw JSON exactly as the Lambda runtime delivers it, so
//! tests exercise the same decoding path as production.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::change_event::StreamRecord;
use crate::relay::KinesisRecord;
use crate::seed::{Clock, IdGenerator};

/// Table name used in generated records.
pub const TEST_TABLE: &str = "dynamodb-archival-poc";
/// Stream ARN used in generated records.
pub const TEST_STREAM_ARN: &str =
    "arn:aws:dynamodb:us-east-1:123456789012:table/dynamodb-archival-poc/stream/2024-01-01T00:00:00.000";

/// Pre-image of a seeded item: `id`, `name`, `expirationTime`.
pub fn item_image(id: &str) -> Value {
    json!({
        "id": {"S": id},
        "name": {"S": "item"},
        "expirationTime": {"N": "1700000000"}
    })
}

fn change_feed_record(event_name: &str, id: &str, dynamodb: Value, user_identity: Option<Value>) -> Value {
    let mut record = json!({
        "eventID": format!("{}-{}", event_name.to_lowercase(), id),
        "eventName": event_name,
        "eventVersion": "1.1",
        "eventSource": "aws:dynamodb",
        "awsRegion": "us-east-1",
        "eventSourceARN": TEST_STREAM_ARN,
        "tableName": TEST_TABLE,
        "dynamodb": dynamodb
    });
    if let (Some(identity), Some(obj)) = (user_identity, record.as_object_mut()) {
        obj.insert("userIdentity".to_string(), identity);
    }
    record
}

/// REMOVE issued by the TTL sweep, as delivered by the change feed.
pub fn ttl_remove_record(id: &str) -> Value {
    remove_record_with_image(
        id,
        item_image(id),
        Some(json!({"type": "Service", "principalId": "dynamodb.amazonaws.com"})),
    )
}

/// REMOVE issued by a user delete. No `userIdentity`.
pub fn remove_record(id: &str) -> Value {
    remove_record_with_image(id, item_image(id), None)
}

/// REMOVE with an arbitrary pre-image.
pub fn remove_record_with_image(id: &str, old_image: Value, user_identity: Option<Value>) -> Value {
    change_feed_record(
        "REMOVE",
        id,
        json!({
            "Keys": {"id": {"S": id}},
            "OldImage": old_image,
            "SequenceNumber": "111",
            "SizeBytes": 64,
            "StreamViewType": "NEW_AND_OLD_IMAGES"
        }),
        user_identity,
    )
}

/// INSERT of a seeded item.
pub fn insert_record(id: &str) -> Value {
    change_feed_record(
        "INSERT",
        id,
        json!({
            "Keys": {"id": {"S": id}},
            "NewImage": item_image(id),
            "SequenceNumber": "100",
            "SizeBytes": 64,
            "StreamViewType": "NEW_AND_OLD_IMAGES"
        }),
        None,
    )
}

/// MODIFY renaming a seeded item.
pub fn modify_record(id: &str) -> Value {
    let mut renamed = item_image(id);
    renamed["name"] = json!({"S": "renamed"});
    change_feed_record(
        "MODIFY",
        id,
        json!({
            "Keys": {"id": {"S": id}},
            "OldImage": item_image(id),
            "NewImage": renamed,
            "SequenceNumber": "105",
            "SizeBytes": 96,
            "StreamViewType": "NEW_AND_OLD_IMAGES"
        }),
        None,
    )
}

/// Wrap a change-feed record as a Kinesis relay record.
///
/// Panics if `record` is not a change record.
pub fn kinesis_record(record: &Value) -> Value {
    let change: StreamRecord = serde_json::from_value(record.clone()).expect("change record");
    let partition_key = change
        .dynamodb
        .as_ref()
        .and_then(|d| d.keys.as_ref())
        .and_then(|k| k.get("id"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    let wrapped = KinesisRecord::wrap(&change, partition_key).expect("wrap change record");
    let mut value = serde_json::to_value(wrapped).expect("serialize kinesis record");
    if let Some(obj) = value.as_object_mut() {
        obj.insert("eventSource".to_string(), json!("aws:kinesis"));
        obj.insert("eventVersion".to_string(), json!("1.0"));
        obj.insert("awsRegion".to_string(), json!("us-east-1"));
    }
    value
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Hands out a fixed sequence of ids, then `id-{n}`.
#[derive(Debug, Default)]
pub struct SequenceIds {
    queued: Mutex<VecDeque<String>>,
    issued: Mutex<usize>,
}

impl SequenceIds {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queued: Mutex::new(ids.into_iter().map(Into::into).collect()),
            issued: Mutex::new(0),
        }
    }
}

impl IdGenerator for SequenceIds {
    fn next_id(&self) -> String {
        let mut issued = self.issued.lock().expect("lock poisoned");
        *issued += 1;
        self.queued
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| format!("id-{}", issued))
    }
}
