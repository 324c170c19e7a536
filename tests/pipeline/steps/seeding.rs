//! Seed writer step definitions.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use cucumber::{given, then, when, World};

use ttl_archival::change_event::AttributeValue;
use ttl_archival::config::SeedConfig;
use ttl_archival::error::ArchivalError;
use ttl_archival::keyed_store::MockKeyedStore;
use ttl_archival::seed::{IdGenerator, SeedResponse, SeedWriter, UuidGenerator};
use ttl_archival::test_utils::FixedClock;

/// Random ids, remembered in issue order.
#[derive(Debug, Default)]
struct RecordingIds {
    issued: Mutex<Vec<String>>,
}

impl RecordingIds {
    fn issued(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }
}

impl IdGenerator for RecordingIds {
    fn next_id(&self) -> String {
        let id = UuidGenerator.next_id();
        self.issued.lock().unwrap().push(id.clone());
        id
    }
}

/// Test context for seed writer scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct SeedingWorld {
    table: Arc<MockKeyedStore>,
    now: DateTime<Utc>,
    ids: Arc<RecordingIds>,
    last_result: Option<Result<SeedResponse, ArchivalError>>,
}

impl fmt::Debug for SeedingWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedingWorld")
            .field("now", &self.now)
            .field("ids", &self.ids)
            .field("last_result", &self.last_result)
            .finish_non_exhaustive()
    }
}

impl SeedingWorld {
    fn new() -> Self {
        Self {
            table: Arc::new(MockKeyedStore::new()),
            now: Utc::now(),
            ids: Arc::new(RecordingIds::default()),
            last_result: None,
        }
    }

    fn writer(&self) -> SeedWriter {
        SeedWriter::new(self.table.clone(), &SeedConfig::default())
            .with_clock(Arc::new(FixedClock(self.now)))
            .with_ids(self.ids.clone())
    }

    async fn invoke(&mut self) {
        self.last_result = Some(self.writer().handle().await);
    }

    fn last_id(&self) -> String {
        self.ids.issued().pop().expect("Nothing seeded")
    }
}

// --- Background ---

#[given("a record table")]
async fn given_table(world: &mut SeedingWorld) {
    assert_eq!(world.table.item_count().await, 0);
}

#[given(expr = "the clock reads epoch second {int}")]
async fn given_clock(world: &mut SeedingWorld, secs: i64) {
    world.now = Utc.timestamp_opt(secs, 0).unwrap();
}

#[given("the table rejects writes")]
async fn given_table_rejects(world: &mut SeedingWorld) {
    world.table.set_fail_on_put(true).await;
}

// --- When steps ---

#[when("the seed writer is invoked")]
async fn when_invoked(world: &mut SeedingWorld) {
    world.invoke().await;
}

#[when(expr = "the seed writer is invoked {int} times")]
async fn when_invoked_times(world: &mut SeedingWorld, times: usize) {
    for _ in 0..times {
        world.invoke().await;
    }
}

// --- Then steps ---

#[then(expr = "the response has status {int}")]
async fn then_status(world: &mut SeedingWorld, status: u16) {
    let response = world.last_result.as_ref().unwrap().as_ref().unwrap();
    assert_eq!(response.status_code, status);
    assert_eq!(
        response.headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );
}

#[then(regex = r"^the response body is (.+)$")]
async fn then_body(world: &mut SeedingWorld, body: String) {
    let response = world.last_result.as_ref().unwrap().as_ref().unwrap();
    assert_eq!(response.body, body);
}

#[then(regex = r"^the table holds (\d+) items?$")]
async fn then_item_count(world: &mut SeedingWorld, count: usize) {
    assert_eq!(world.table.item_count().await, count);
}

#[then(expr = "the seeded item has name {string}")]
async fn then_item_name(world: &mut SeedingWorld, name: String) {
    let stored = world
        .table
        .item(&world.last_id())
        .await
        .expect("Item not in table");
    assert_eq!(stored.get("name").and_then(AttributeValue::as_str), Some(name.as_str()));
}

#[then(expr = "the seeded item expires at epoch second {int}")]
async fn then_item_expiry(world: &mut SeedingWorld, secs: i64) {
    let stored = world
        .table
        .item(&world.last_id())
        .await
        .expect("Item not in table");
    assert_eq!(
        stored.get("expirationTime"),
        Some(&AttributeValue::Number(secs.to_string()))
    );
}

#[then("every seeded id is distinct")]
async fn then_ids_distinct(world: &mut SeedingWorld) {
    let issued = world.ids.issued();
    let distinct: HashSet<&String> = issued.iter().collect();
    assert_eq!(distinct.len(), issued.len());
}

#[then("the invocation fails")]
async fn then_fails(world: &mut SeedingWorld) {
    assert!(matches!(world.last_result, Some(Err(_))));
}
