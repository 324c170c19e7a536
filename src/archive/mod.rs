//! Archival of removed records.
//!
//! Each REMOVE event becomes one [`ArchivedRecord`]: the object key
//! `record-{id}` and the JSON pre-image as its body. The same id always maps
//! to the same key, so archiving an event twice leaves one object.

mod processor;

pub use processor::{
    ArchivalProcessor, BatchReport, Disposition, InvalidRecordPolicy, ProcessorOptions,
    SkipReason,
};

use crate::change_event::{AttributeValue, ChangeEvent, EventName, Image, ValidationError};

/// Prefix of every archive object key.
pub const RECORD_KEY_PREFIX: &str = "record-";
/// Attribute holding the item identifier.
pub const ID_ATTRIBUTE: &str = "id";

/// Build the object key for an item id.
pub fn record_key(id: &str, prefix: Option<&str>) -> String {
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}/{}{}", prefix, RECORD_KEY_PREFIX, id),
        None => format!("{}{}", RECORD_KEY_PREFIX, id),
    }
}

/// Extract the item id from an image.
pub fn item_id(image: &Image) -> Result<&str, ValidationError> {
    match image.get(ID_ATTRIBUTE) {
        None => Err(ValidationError::MissingId),
        Some(AttributeValue::String(id)) if id.is_empty() => Err(ValidationError::EmptyId),
        Some(AttributeValue::String(id)) => Ok(id),
        Some(other) => Err(ValidationError::IdNotString(other.type_tag())),
    }
}

/// One object to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedRecord {
    pub key: String,
    pub body: Vec<u8>,
}

impl ArchivedRecord {
    /// Archive form of a pre-removal image.
    pub fn from_pre_image(image: &Image, prefix: Option<&str>) -> Result<Self, ValidationError> {
        if image.is_empty() {
            return Err(ValidationError::MissingPreImage(EventName::Remove));
        }
        let key = record_key(item_id(image)?, prefix);
        let body = image
            .to_json()
            .map_err(|e| ValidationError::MalformedRecord(e.to_string()))?;
        Ok(Self { key, body })
    }

    /// Archive form of an event's pre-image.
    pub fn from_event(event: &ChangeEvent, prefix: Option<&str>) -> Result<Self, ValidationError> {
        let image = event
            .pre_image()
            .ok_or(ValidationError::MissingPreImage(event.event_name()))?;
        Self::from_pre_image(image, prefix)
    }
}
