//! Batch processor for the archival Lambda.
//!
//! ## Flow
//! ```text
//! StreamBatch ──> classify each record ──> ArchivedRecord[] ──> concurrent puts ──> join
//!                   │                                              │
//!                   ├─ skip: not a REMOVE, filtered out            └─ any failure fails the batch
//!                   └─ reject: invalid (fail batch or skip)
//! ```
//!
//! There is no partial-batch acknowledgement: the invocation fails if any
//! write fails, and the event source mapping redelivers the whole batch.
//! Writes are per-key overwrites, so records that were already archived on a
//! failed attempt are written again with the same content.

use std::sync::Arc;

use backon::Retryable;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::ArchivedRecord;
use crate::change_event::{EventName, ValidationError};
use crate::config::WriteRetryConfig;
use crate::error::{ArchivalError, Result};
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::relay::{decode_record, EventFilter, RecordSource, StreamBatch, Trigger, RELAY_BATCH_SIZE};
use crate::utils::retry::write_backoff;

/// Handling of records that fail validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRecordPolicy {
    /// Fail the invocation before any write is issued.
    #[default]
    Fail,
    /// Log the record, count it as rejected and continue.
    Skip,
}

/// Processor behavior, usually built from `ArchiverConfig`.
#[derive(Debug, Clone, Default)]
pub struct ProcessorOptions {
    pub key_prefix: Option<String>,
    pub invalid_records: InvalidRecordPolicy,
    /// Apply the TTL-expiry filter to relay records as well.
    pub relay_expiry_only: bool,
    pub retry: WriteRetryConfig,
}

/// Why a record produced no write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// INSERT or MODIFY; only removals are archived.
    NotARemoval(EventName),
    /// A REMOVE the source's filter does not select.
    FilteredOut(RecordSource),
}

/// Outcome of classifying one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Archive(ArchivedRecord),
    Skip(SkipReason),
    Reject(ValidationError),
}

/// Summary of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub received: usize,
    /// Keys written, in record order.
    pub archived: Vec<String>,
    pub skipped: usize,
    /// Invalid records passed over under [`InvalidRecordPolicy::Skip`].
    pub rejected: usize,
}

/// Archives the REMOVE events of a batch to an object store.
pub struct ArchivalProcessor {
    store: Arc<dyn ObjectStore>,
    options: ProcessorOptions,
}

impl ArchivalProcessor {
    pub fn new(store: Arc<dyn ObjectStore>, options: ProcessorOptions) -> Self {
        Self { store, options }
    }

    /// Filter applied to REMOVE events from `source`, if any.
    fn filter_for(&self, source: RecordSource) -> Option<EventFilter> {
        match source {
            RecordSource::ChangeFeed => Trigger::for_source(source).filter,
            RecordSource::Relay => self
                .options
                .relay_expiry_only
                .then(EventFilter::ttl_expiry),
        }
    }

    /// Decide what to do with one raw record. Performs no I/O.
    pub fn classify(&self, raw: &Value) -> Disposition {
        let inbound = match decode_record(raw) {
            Ok(inbound) => inbound,
            Err(e) => return Disposition::Reject(e),
        };

        let event_name = inbound.event.event_name();
        if event_name != EventName::Remove {
            return Disposition::Skip(SkipReason::NotARemoval(event_name));
        }

        if let Some(filter) = self.filter_for(inbound.source) {
            if !filter.matches(&inbound.event) {
                return Disposition::Skip(SkipReason::FilteredOut(inbound.source));
            }
        }

        match ArchivedRecord::from_event(&inbound.event, self.options.key_prefix.as_deref()) {
            Ok(record) => Disposition::Archive(record),
            Err(e) => Disposition::Reject(e),
        }
    }

    /// Archive every selected record of the batch.
    ///
    /// Succeeds only if every write succeeds.
    pub async fn process_batch(&self, batch: StreamBatch) -> Result<BatchReport> {
        let received = batch.len();
        info!(
            count = received,
            records = %serde_json::to_string(&batch.records).unwrap_or_default(),
            "Received batch"
        );
        if received > RELAY_BATCH_SIZE as usize {
            warn!(
                count = received,
                max = RELAY_BATCH_SIZE,
                "Batch larger than the configured mapping batch size"
            );
        }

        let mut report = BatchReport {
            received,
            ..Default::default()
        };
        let mut records = Vec::with_capacity(received);

        for (index, raw) in batch.records.iter().enumerate() {
            match self.classify(raw) {
                Disposition::Archive(record) => records.push(record),
                Disposition::Skip(reason) => {
                    debug!(index, reason = ?reason, "Skipping record");
                    report.skipped += 1;
                }
                Disposition::Reject(source) => {
                    error!(index, record = %raw, error = %source, "Invalid record");
                    match self.options.invalid_records {
                        InvalidRecordPolicy::Fail => {
                            return Err(ArchivalError::InvalidRecord { index, source })
                        }
                        InvalidRecordPolicy::Skip => report.rejected += 1,
                    }
                }
            }
        }

        let total = records.len();
        let results = join_all(records.iter().map(|record| self.write(record))).await;

        let mut failures = Vec::new();
        for (record, result) in records.iter().zip(results) {
            match result {
                Ok(()) => report.archived.push(record.key.clone()),
                Err(e) => {
                    error!(
                        location = %self.store.location(&record.key),
                        body = %String::from_utf8_lossy(&record.body),
                        error = %e,
                        "Failed to archive record"
                    );
                    failures.push(e);
                }
            }
        }

        let failed = failures.len();
        if let Some(source) = failures.into_iter().next() {
            error!(failed, total, "Error processing records");
            return Err(ArchivalError::WritesFailed {
                failed,
                total,
                source,
            });
        }

        info!(
            archived = report.archived.len(),
            skipped = report.skipped,
            rejected = report.rejected,
            "Records processed successfully"
        );
        Ok(report)
    }

    /// Write one record, retrying transient store errors.
    async fn write(&self, record: &ArchivedRecord) -> std::result::Result<(), ObjectStoreError> {
        (|| self.store.put_object(&record.key, &record.body))
            .retry(write_backoff(&self.options.retry))
            .when(ObjectStoreError::is_transient)
            .notify(|err, delay| {
                warn!(key = %record.key, error = %err, delay = ?delay, "Retrying archive write");
            })
            .await
    }
}
