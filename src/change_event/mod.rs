//! Change events of the record table.
//!
//! Stream records are decoded into [`StreamRecord`] and then validated into a
//! [`ChangeEvent`], whose [`Change`] variant carries exactly the images its
//! event name guarantees. Nothing downstream touches the raw record.

mod attribute;
mod wire;

pub use attribute::{AttributeValue, Image};
pub use wire::{StreamPayload, StreamRecord, UserIdentity};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Principal type DynamoDB reports for its own TTL deletions.
pub const TTL_PRINCIPAL_TYPE: &str = "Service";
/// Principal id DynamoDB reports for its own TTL deletions.
pub const TTL_PRINCIPAL_ID: &str = "dynamodb.amazonaws.com";

/// Errors raised while validating a stream record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Unknown event source: {0}")]
    UnknownEventSource(String),

    #[error("Record has no eventName")]
    MissingEventName,

    #[error("Unknown eventName: {0}")]
    UnknownEventName(String),

    #[error("Record has no dynamodb section")]
    MissingStreamPayload,

    #[error("{0} event has no pre-image")]
    MissingPreImage(EventName),

    #[error("{0} event has no post-image")]
    MissingPostImage(EventName),

    #[error("{event_name} event must not carry a {image}")]
    UnexpectedImage {
        event_name: EventName,
        image: &'static str,
    },

    #[error("Pre-image has no id attribute")]
    MissingId,

    #[error("Pre-image id must be a string, got {0}")]
    IdNotString(&'static str),

    #[error("Pre-image id is empty")]
    EmptyId,
}

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventName {
    Insert,
    Modify,
    Remove,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Modify => "MODIFY",
            Self::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(Self::Insert),
            "MODIFY" => Ok(Self::Modify),
            "REMOVE" => Ok(Self::Remove),
            other => Err(ValidationError::UnknownEventName(other.to_string())),
        }
    }
}

/// Who caused a change.
pub type Actor = UserIdentity;

impl UserIdentity {
    /// True when the change was made by the table's own TTL sweep.
    pub fn is_ttl_expiry(&self) -> bool {
        self.principal_type == TTL_PRINCIPAL_TYPE && self.principal_id == TTL_PRINCIPAL_ID
    }
}

/// Record metadata carried alongside the change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventMeta {
    pub event_id: Option<String>,
    pub event_source_arn: Option<String>,
    pub aws_region: Option<String>,
    pub table_name: Option<String>,
    pub sequence_number: Option<String>,
    pub keys: Image,
    pub approximate_creation_time: Option<f64>,
}

/// The mutation itself, with the images each kind guarantees.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert { new_image: Image },
    Modify { old_image: Image, new_image: Image },
    Remove { old_image: Image },
}

/// A validated change event.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub meta: EventMeta,
    pub actor: Option<Actor>,
    pub change: Change,
}

impl ChangeEvent {
    pub fn event_name(&self) -> EventName {
        match self.change {
            Change::Insert { .. } => EventName::Insert,
            Change::Modify { .. } => EventName::Modify,
            Change::Remove { .. } => EventName::Remove,
        }
    }

    /// Item state before the change (MODIFY and REMOVE).
    pub fn pre_image(&self) -> Option<&Image> {
        match &self.change {
            Change::Insert { .. } => None,
            Change::Modify { old_image, .. } | Change::Remove { old_image } => Some(old_image),
        }
    }

    /// Item state after the change (INSERT and MODIFY).
    pub fn post_image(&self) -> Option<&Image> {
        match &self.change {
            Change::Insert { new_image } | Change::Modify { new_image, .. } => Some(new_image),
            Change::Remove { .. } => None,
        }
    }

    /// True for REMOVE events issued by the TTL sweep.
    pub fn is_ttl_expiry(&self) -> bool {
        self.event_name() == EventName::Remove
            && self.actor.as_ref().is_some_and(UserIdentity::is_ttl_expiry)
    }
}

fn non_empty(image: Option<Image>) -> Option<Image> {
    image.filter(|i| !i.is_empty())
}

impl TryFrom<StreamRecord> for ChangeEvent {
    type Error = ValidationError;

    fn try_from(record: StreamRecord) -> Result<Self, Self::Error> {
        let event_name: EventName = record
            .event_name
            .as_deref()
            .ok_or(ValidationError::MissingEventName)?
            .parse()?;

        let payload = record
            .dynamodb
            .ok_or(ValidationError::MissingStreamPayload)?;
        let old_image = non_empty(payload.old_image);
        let new_image = non_empty(payload.new_image);

        let change = match event_name {
            EventName::Insert => {
                if old_image.is_some() {
                    return Err(ValidationError::UnexpectedImage {
                        event_name,
                        image: "pre-image",
                    });
                }
                Change::Insert {
                    new_image: new_image.ok_or(ValidationError::MissingPostImage(event_name))?,
                }
            }
            EventName::Modify => Change::Modify {
                old_image: old_image.ok_or(ValidationError::MissingPreImage(event_name))?,
                new_image: new_image.ok_or(ValidationError::MissingPostImage(event_name))?,
            },
            EventName::Remove => {
                if new_image.is_some() {
                    return Err(ValidationError::UnexpectedImage {
                        event_name,
                        image: "post-image",
                    });
                }
                Change::Remove {
                    old_image: old_image.ok_or(ValidationError::MissingPreImage(event_name))?,
                }
            }
        };

        Ok(Self {
            meta: EventMeta {
                event_id: record.event_id,
                event_source_arn: record.event_source_arn,
                aws_region: record.aws_region,
                table_name: record.table_name,
                sequence_number: payload.sequence_number,
                keys: payload.keys.unwrap_or_default(),
                approximate_creation_time: payload.approximate_creation_date_time,
            },
            actor: record.user_identity,
            change,
        })
    }
}
