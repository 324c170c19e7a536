//! TTL archival pipeline.
//!
//! Items written to a DynamoDB table with an `expirationTime` attribute are
//! deleted by the table's TTL sweep. Each deletion reaches the archival
//! processor either through DynamoDB Streams or through the Kinesis relay,
//! and the processor writes the item's last state to an object store.

pub mod archive;
pub mod change_event;
pub mod config;
pub mod error;
pub mod keyed_store;
pub mod object_store;
pub mod relay;
pub mod seed;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
