//! Typed attribute values and item images.
//!
//! Values use the DynamoDB JSON encoding as it appears on both the stream
//! and the Kinesis relay: a single-key object whose key names the type.
//! ```text
//! {"id": {"S": "abc-123"}, "expirationTime": {"N": "1700000000"}}
//! ```
//!
//! Images keep attribute order as received so an archived body is the same
//! document the stream delivered.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    String(String),
    /// Numbers travel as decimal strings to keep full precision.
    #[serde(rename = "N")]
    Number(String),
    /// Base64 encoded binary.
    #[serde(rename = "B")]
    Binary(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "L")]
    List(Vec<AttributeValue>),
    #[serde(rename = "M")]
    Map(Image),
    #[serde(rename = "SS")]
    StringSet(Vec<String>),
    #[serde(rename = "NS")]
    NumberSet(Vec<String>),
    #[serde(rename = "BS")]
    BinarySet(Vec<String>),
}

impl AttributeValue {
    /// Wire type tag (`S`, `N`, `BOOL`, ...).
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::String(_) => "S",
            Self::Number(_) => "N",
            Self::Binary(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::Null(_) => "NULL",
            Self::List(_) => "L",
            Self::Map(_) => "M",
            Self::StringSet(_) => "SS",
            Self::NumberSet(_) => "NS",
            Self::BinarySet(_) => "BS",
        }
    }

    /// The string payload if this is an `S` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build an `N` value from any integer.
    pub fn number(n: impl Into<i64>) -> Self {
        Self::Number(n.into().to_string())
    }
}

/// An item's attributes, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    entries: Vec<(String, AttributeValue)>,
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute. A replaced attribute keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Serialize to the DynamoDB JSON document used as the archive body.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl FromIterator<(String, AttributeValue)> for Image {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        let mut image = Image::new();
        for (name, value) in iter {
            image.insert(name, value);
        }
        image
    }
}

impl Serialize for Image {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct ImageVisitor;

impl<'de> Visitor<'de> for ImageVisitor {
    type Value = Image;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of attribute names to typed values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Image, A::Error> {
        let mut image = Image {
            entries: Vec::with_capacity(access.size_hint().unwrap_or(0)),
        };
        while let Some((name, value)) = access.next_entry::<String, AttributeValue>()? {
            image.insert(name, value);
        }
        Ok(image)
    }
}

impl<'de> Deserialize<'de> for Image {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ImageVisitor)
    }
}
