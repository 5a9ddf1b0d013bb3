//! JSON Schema data model
//!
//! A resolved (reference-free) JSON Schema node, typed for the keywords the
//! structured-output compiler cares about. Keywords it does not model are kept
//! in [`Schema::extra`] so documents round-trip until compilation drops them.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::Result;

/// Primitive types accepted by structured outputs.
pub const SUPPORTED_TYPES: &[&str] = &[
    "string", "number", "integer", "boolean", "array", "object", "null",
];

/// String formats accepted by structured outputs.
pub const SUPPORTED_FORMATS: &[&str] = &[
    "date-time", "time", "date", "duration", "email", "hostname", "ipv4", "ipv6", "uuid",
];

pub const TYPE_NULL: &str = "null";
pub const TYPE_OBJECT: &str = "object";
pub const TYPE_ARRAY: &str = "array";

/// A single JSON Schema node
///
/// Boolean schemas decode wherever a sub-schema may appear: `true` is the
/// empty schema and `false` is [`Schema::nothing`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct Schema {
    /// `type`, either one name or a list of names
    #[serde(rename = "type", default, skip_serializing_if = "TypeTags::is_empty")]
    pub type_tags: TypeTags,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,

    // String
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    // Number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,

    // Array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,

    // Object
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,

    // Keywords whose presence rules a node out of structured outputs.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub r#const: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique_items: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<IndexMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_items: Option<Vec<Schema>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,

    /// Every other keyword (`title`, `description`, `enum`, extensions, ...)
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Schema {
    /// A schema constrained to a single type
    pub fn of_type(name: impl Into<String>) -> Self {
        Self {
            type_tags: TypeTags::single(name),
            ..Self::default()
        }
    }

    /// The schema no value matches: `{"not": {}}`
    pub fn nothing() -> Self {
        Self {
            not: Some(Box::default()),
            ..Self::default()
        }
    }

    /// An object schema over the given properties
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self {
            type_tags: TypeTags::single(TYPE_OBJECT),
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    /// An array schema applying `item` to every element
    pub fn array_of(item: Schema) -> Self {
        Self {
            type_tags: TypeTags::single(TYPE_ARRAY),
            items: Some(Items::Single(Box::new(item))),
            ..Self::default()
        }
    }

    /// Decode a schema from a JSON document
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode this schema as a JSON document
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn is_any_of(&self) -> bool {
        !self.any_of.is_empty()
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Schema::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(true) => Ok(Schema::default()),
            Value::Bool(false) => Ok(Schema::nothing()),
            value => Schema::deserialize(value).map_err(de::Error::custom),
        }
    }
}

/// The `type` keyword.
///
/// Documents carry either one type name or a list; in memory both may be set
/// at once, so the two are kept side by side until compilation normalizes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTags {
    pub scalar: Option<String>,
    pub list: Vec<String>,
}

impl TypeTags {
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            scalar: Some(name.into()),
            list: Vec::new(),
        }
    }

    pub fn many<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scalar: None,
            list: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scalar.is_none() && self.list.is_empty()
    }

    /// List entries first, then the scalar. Duplicates are not removed.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.list.iter().chain(self.scalar.iter()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|t| t == name)
    }

    /// True when `null` is the only type named
    pub fn is_null_only(&self) -> bool {
        !self.is_empty() && self.iter().all(|t| t == TYPE_NULL)
    }
}

impl Serialize for TypeTags {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match (&self.scalar, self.list.is_empty()) {
            (Some(scalar), true) => serializer.serialize_str(scalar),
            (None, true) => serializer.serialize_none(),
            (scalar, false) => {
                let mut seq = serializer.serialize_seq(None)?;
                for name in &self.list {
                    seq.serialize_element(name)?;
                }
                if let Some(scalar) = scalar.as_ref().filter(|s| !self.list.contains(s)) {
                    seq.serialize_element(scalar)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for TypeTags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::One(name) => TypeTags::single(name),
            Repr::Many(names) => TypeTags::many(names),
        })
    }
}

/// The `items` keyword: one schema for every element, or one per position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Tuple(Vec<Schema>),
    Single(Box<Schema>),
}

/// The `additionalProperties` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

impl AdditionalProperties {
    /// Rejects every key not listed in `properties`
    pub fn nothing() -> Self {
        Self::Schema(Box::new(Schema::nothing()))
    }

    pub fn is_nothing(&self) -> bool {
        match self {
            Self::Allowed(allowed) => !allowed,
            Self::Schema(schema) => **schema == Schema::nothing(),
        }
    }
}

// `const: null` is still a `const`.
fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn is_false(value: &bool) -> bool {
    !value
}
