//! Archival step definitions.

use std::fmt;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use cucumber::{given, then, when, World};
use serde_json::{json, Value};

use ttl_archival::archive::{ArchivalProcessor, BatchReport, ProcessorOptions};
use ttl_archival::config::{SeedConfig, WriteRetryConfig};
use ttl_archival::error::{ArchivalError, ErrorKind};
use ttl_archival::keyed_store::MockKeyedStore;
use ttl_archival::object_store::MockObjectStore;
use ttl_archival::relay::StreamBatch;
use ttl_archival::seed::SeedWriter;
use ttl_archival::test_utils::{
    insert_record, kinesis_record, remove_record, remove_record_with_image, FixedClock,
    SequenceIds,
};

/// Test context for archival scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct ArchivalWorld {
    table: Arc<MockKeyedStore>,
    archive: Arc<MockObjectStore>,
    processor: ArchivalProcessor,
    expired: Option<Value>,
    last_batch: Option<StreamBatch>,
    last_result: Option<Result<BatchReport, ArchivalError>>,
}

impl fmt::Debug for ArchivalWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchivalWorld")
            .field("expired", &self.expired)
            .field("last_batch", &self.last_batch)
            .field("last_result", &self.last_result)
            .finish_non_exhaustive()
    }
}

impl ArchivalWorld {
    fn new() -> Self {
        let archive = Arc::new(MockObjectStore::new());
        let processor = ArchivalProcessor::new(
            archive.clone(),
            ProcessorOptions {
                retry: WriteRetryConfig {
                    max_retries: 2,
                    min_delay_ms: 1,
                    max_delay_ms: 5,
                },
                ..Default::default()
            },
        );
        Self {
            table: Arc::new(MockKeyedStore::new()),
            archive,
            processor,
            expired: None,
            last_batch: None,
            last_result: None,
        }
    }

    async fn deliver(&mut self, records: Vec<Value>) {
        let batch = StreamBatch::new(records);
        self.last_result = Some(self.processor.process_batch(batch.clone()).await);
        self.last_batch = Some(batch);
    }

    fn result(&self) -> &Result<BatchReport, ArchivalError> {
        self.last_result.as_ref().expect("No batch delivered")
    }
}

fn quoted(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// --- Background ---

#[given("an empty archive bucket")]
async fn given_empty_bucket(world: &mut ArchivalWorld) {
    assert_eq!(world.archive.object_count().await, 0);
}

// --- Given steps ---

#[given(expr = "a seeded item {string}")]
async fn given_seeded_item(world: &mut ArchivalWorld, id: String) {
    let clock = FixedClock(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    let writer = SeedWriter::new(world.table.clone(), &SeedConfig::default())
        .with_clock(Arc::new(clock))
        .with_ids(Arc::new(SequenceIds::new([id])));

    writer.seed().await.expect("Failed to seed item");
}

#[given(expr = "writes to {string} fail")]
async fn given_key_fails(world: &mut ArchivalWorld, key: String) {
    world.archive.set_fail_on_key(key).await;
}

#[given(expr = "the next {int} writes are throttled")]
async fn given_throttled(world: &mut ArchivalWorld, count: usize) {
    world.archive.fail_next_writes(count).await;
}

// --- When steps ---

#[when(expr = "the TTL sweep removes {string}")]
async fn when_ttl_sweep(world: &mut ArchivalWorld, id: String) {
    let image = world.table.expire(&id).await.expect("Item not in table");
    world.expired = Some(serde_json::to_value(image).unwrap());
}

#[when("the change feed delivers the removal")]
async fn when_change_feed_delivers(world: &mut ArchivalWorld) {
    let image = world.expired.clone().expect("Nothing expired");
    let id = image["id"]["S"].as_str().unwrap_or_default().to_string();
    let record = remove_record_with_image(
        &id,
        image,
        Some(json!({"type": "Service", "principalId": "dynamodb.amazonaws.com"})),
    );
    world.deliver(vec![record]).await;
}

#[when(expr = "the change feed delivers a user delete of {string}")]
async fn when_change_feed_user_delete(world: &mut ArchivalWorld, id: String) {
    world.deliver(vec![remove_record(&id)]).await;
}

#[when(regex = r"^the relay delivers removals of (.+)$")]
async fn when_relay_delivers(world: &mut ArchivalWorld, ids: String) {
    let records = quoted(&ids)
        .iter()
        .map(|id| kinesis_record(&remove_record(id)))
        .collect();
    world.deliver(records).await;
}

#[when(expr = "the relay delivers an insert of {string}")]
async fn when_relay_insert(world: &mut ArchivalWorld, id: String) {
    world.deliver(vec![kinesis_record(&insert_record(&id))]).await;
}

#[when(expr = "the relay delivers a removal of {string} and a removal without an id")]
async fn when_relay_missing_id(world: &mut ArchivalWorld, id: String) {
    let no_id = remove_record_with_image("unknown", json!({"name": {"S": "item"}}), None);
    world
        .deliver(vec![
            kinesis_record(&remove_record(&id)),
            kinesis_record(&no_id),
        ])
        .await;
}

#[when("writes recover")]
async fn when_writes_recover(world: &mut ArchivalWorld) {
    world.archive.clear_failures().await;
}

#[when("the relay redelivers the same batch")]
async fn when_redeliver(world: &mut ArchivalWorld) {
    let batch = world.last_batch.clone().expect("No batch delivered");
    world.deliver(batch.records).await;
}

// --- Then steps ---

#[then("the invocation succeeds")]
async fn then_succeeds(world: &mut ArchivalWorld) {
    assert!(world.result().is_ok(), "Expected success, got {:?}", world.result());
}

#[then("the invocation fails")]
async fn then_fails(world: &mut ArchivalWorld) {
    assert!(world.result().is_err(), "Expected failure");
}

#[then("the invocation fails with a validation error")]
async fn then_fails_validation(world: &mut ArchivalWorld) {
    match world.result() {
        Err(e) => assert_eq!(e.kind(), ErrorKind::Validation),
        Ok(report) => panic!("Expected validation error, got {:?}", report),
    }
}

#[then(regex = r"^the archive holds (\d+) objects?$")]
async fn then_object_count(world: &mut ArchivalWorld, count: usize) {
    assert_eq!(world.archive.object_count().await, count);
}

#[then(regex = r"^the archive holds objects (.+)$")]
async fn then_objects(world: &mut ArchivalWorld, keys: String) {
    assert_eq!(world.archive.keys().await, quoted(&keys));
}

#[then(expr = "object {string} exists")]
async fn then_object_exists(world: &mut ArchivalWorld, key: String) {
    assert!(world.archive.object(&key).await.is_some(), "Missing {}", key);
}

#[then(regex = r#"^object "([^"]+)" has body (.+)$"#)]
async fn then_object_body(world: &mut ArchivalWorld, key: String, body: String) {
    let stored = world.archive.object(&key).await.expect("Object not found");
    assert_eq!(String::from_utf8(stored).unwrap(), body);
}

#[then("no write was attempted")]
async fn then_no_writes(world: &mut ArchivalWorld) {
    assert_eq!(world.archive.attempt_count().await, 0);
}
