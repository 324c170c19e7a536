//! Event filters and trigger descriptions.
//!
//! [`EventFilter`] is the predicate the change-feed event source mapping
//! applies server side. The processor evaluates the same value locally, and
//! [`EventFilter::pattern`] renders it as a Lambda filter-criteria pattern so
//! the deployed filter and the local check cannot drift apart.

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::RecordSource;
use crate::change_event::{ChangeEvent, EventName, TTL_PRINCIPAL_ID, TTL_PRINCIPAL_TYPE};

/// Batch size of the relay event source mapping.
pub const RELAY_BATCH_SIZE: u32 = 100;

/// Selects change events by name and actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    event_names: Vec<EventName>,
    principal_type: Option<String>,
    principal_id: Option<String>,
}

impl EventFilter {
    /// Matches only REMOVE events issued by the table's TTL sweep.
    pub fn ttl_expiry() -> Self {
        Self {
            event_names: vec![EventName::Remove],
            principal_type: Some(TTL_PRINCIPAL_TYPE.to_string()),
            principal_id: Some(TTL_PRINCIPAL_ID.to_string()),
        }
    }

    /// Matches the given event names from any actor.
    pub fn event_names(names: impl IntoIterator<Item = EventName>) -> Self {
        Self {
            event_names: names.into_iter().collect(),
            principal_type: None,
            principal_id: None,
        }
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if !self.event_names.is_empty() && !self.event_names.contains(&event.event_name()) {
            return false;
        }

        let actor = event.actor.as_ref();
        if let Some(expected) = &self.principal_type {
            if actor.map(|a| &a.principal_type) != Some(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.principal_id {
            if actor.map(|a| &a.principal_id) != Some(expected) {
                return false;
            }
        }
        true
    }

    /// Lambda filter-criteria pattern for this filter.
    pub fn pattern(&self) -> Value {
        let mut pattern = Map::new();
        if !self.event_names.is_empty() {
            let names: Vec<&str> = self.event_names.iter().map(EventName::as_str).collect();
            pattern.insert("eventName".to_string(), json!(names));
        }

        let mut identity = Map::new();
        if let Some(principal_type) = &self.principal_type {
            identity.insert("type".to_string(), json!([principal_type]));
        }
        if let Some(principal_id) = &self.principal_id {
            identity.insert("principalId".to_string(), json!([principal_id]));
        }
        if !identity.is_empty() {
            pattern.insert("userIdentity".to_string(), Value::Object(identity));
        }

        Value::Object(pattern)
    }
}

/// Where a new event source mapping starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartingPosition {
    Latest,
    TrimHorizon,
}

/// One of the two event source mappings feeding the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub source: RecordSource,
    pub starting_position: StartingPosition,
    /// `None` keeps the service default.
    pub batch_size: Option<u32>,
    /// Server-side filter, if any.
    pub filter: Option<EventFilter>,
}

impl Trigger {
    /// DynamoDB Streams mapping: TTL removals only, from the stream tip.
    pub fn change_feed() -> Self {
        Self {
            source: RecordSource::ChangeFeed,
            starting_position: StartingPosition::Latest,
            batch_size: None,
            filter: Some(EventFilter::ttl_expiry()),
        }
    }

    /// Kinesis relay mapping: unfiltered, from the oldest retained record.
    pub fn relay() -> Self {
        Self {
            source: RecordSource::Relay,
            starting_position: StartingPosition::TrimHorizon,
            batch_size: Some(RELAY_BATCH_SIZE),
            filter: None,
        }
    }

    pub fn for_source(source: RecordSource) -> Self {
        match source {
            RecordSource::ChangeFeed => Self::change_feed(),
            RecordSource::Relay => Self::relay(),
        }
    }

    /// Filter criteria document for the event source mapping.
    pub fn filter_criteria(&self) -> Option<Value> {
        self.filter.as_ref().map(|f| {
            json!({ "Filters": [{ "Pattern": f.pattern().to_string() }] })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_event::{Actor, Change, EventMeta, Image};

    fn event(change: Change, actor: Option<(&str, &str)>) -> ChangeEvent {
        ChangeEvent {
            meta: EventMeta::default(),
            actor: actor.map(|(t, id)| Actor {
                principal_type: t.to_string(),
                principal_id: id.to_string(),
            }),
            change,
        }
    }

    fn remove() -> Change {
        Change::Remove {
            old_image: Image::new(),
        }
    }

    #[test]
    fn test_ttl_filter_matches_service_removals_only() {
        let filter = EventFilter::ttl_expiry();

        assert!(filter.matches(&event(remove(), Some(("Service", "dynamodb.amazonaws.com")))));
        assert!(!filter.matches(&event(remove(), None)));
        assert!(!filter.matches(&event(remove(), Some(("Service", "other.amazonaws.com")))));
        assert!(!filter.matches(&event(
            Change::Insert {
                new_image: Image::new()
            },
            Some(("Service", "dynamodb.amazonaws.com"))
        )));
    }

    #[test]
    fn test_name_filter_ignores_actor() {
        let filter = EventFilter::event_names([EventName::Remove]);
        assert!(filter.matches(&event(remove(), None)));
    }

    #[test]
    fn test_ttl_pattern_shape() {
        assert_eq!(
            EventFilter::ttl_expiry().pattern(),
            json!({
                "eventName": ["REMOVE"],
                "userIdentity": {
                    "type": ["Service"],
                    "principalId": ["dynamodb.amazonaws.com"]
                }
            })
        );
    }

    #[test]
    fn test_triggers() {
        let feed = Trigger::change_feed();
        assert_eq!(feed.starting_position, StartingPosition::Latest);
        assert!(feed.filter_criteria().is_some());

        let relay = Trigger::for_source(RecordSource::Relay);
        assert_eq!(relay.starting_position, StartingPosition::TrimHorizon);
        assert_eq!(relay.batch_size, Some(100));
        assert!(relay.filter_criteria().is_none());
        assert_eq!(
            serde_json::to_value(relay.starting_position).unwrap(),
            json!("TRIM_HORIZON")
        );
    }
}
