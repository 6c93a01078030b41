//! Backend wire format of condition trees.
//!
//! # JSON Format
//!
//! ```json
//! { "and": [
//!     { "column": "status", "operator": "=", "value": 500, "ignore_case": false },
//!     { "or": [ ... ] }
//! ]}
//! ```
//!
//! A group object has exactly one key, `and` or `or`. Objects with no key,
//! both keys, or any other single key are rejected at the boundary rather
//! than guessed at.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Conjunction, Predicate};

/// A group of the backend tree.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendGroup {
    /// Connective, encoded as the object's single key.
    pub conjunction: Conjunction,
    /// Nested groups and leaf predicates.
    pub children: Vec<BackendNode>,
}

/// A node of the backend tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BackendNode {
    /// `{ "and": [...] }` or `{ "or": [...] }`.
    Group(BackendGroup),
    /// Flat `{ column, operator, value, ignore_case }`.
    Leaf(Predicate),
}

impl BackendGroup {
    /// Creates a group.
    #[must_use]
    pub fn new(conjunction: Conjunction, children: Vec<BackendNode>) -> Self {
        Self {
            conjunction,
            children,
        }
    }

    /// Converts a JSON value to a backend group.
    ///
    /// # Returns
    ///
    /// `Some(BackendGroup)` if the value is an object with exactly one
    /// `and`/`or` key holding an array, `None` otherwise.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let conjunction = single_group_key(obj)?;
        let Some(children) = obj.get(conjunction.as_str()).and_then(Value::as_array) else {
            tracing::debug!(
                "Rejected backend group: `{}` does not hold an array",
                conjunction.as_str()
            );
            return None;
        };

        Some(Self {
            conjunction,
            children: children.iter().filter_map(BackendNode::from_json).collect(),
        })
    }

    /// Renders the group as JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let children = self.children.iter().map(BackendNode::to_json).collect();
        let mut obj = Map::with_capacity(1);
        obj.insert(self.conjunction.as_str().to_string(), Value::Array(children));
        Value::Object(obj)
    }
}

impl BackendNode {
    /// Classifies a child of a backend group.
    ///
    /// A child whose only key is `and` or `or` is a nested group; anything
    /// else is read as a leaf with defaults for missing fields. A
    /// group-shaped child whose payload is not an array is dropped.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let is_group = value
            .as_object()
            .is_some_and(|obj| single_group_key(obj).is_some());
        if is_group {
            BackendGroup::from_json(value).map(Self::Group)
        } else {
            Some(Self::Leaf(Predicate::from_json_lossy(value)))
        }
    }

    /// Renders the node as JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Group(group) => group.to_json(),
            Self::Leaf(predicate) => serde_json::json!({
                "column": predicate.column,
                "operator": predicate.operator.as_str(),
                "value": predicate.value,
                "ignore_case": predicate.ignore_case,
            }),
        }
    }
}

/// Returns the connective of an object whose only key is `and` or `or`.
fn single_group_key(obj: &Map<String, Value>) -> Option<Conjunction> {
    if obj.len() != 1 {
        return None;
    }
    obj.keys().next().and_then(|key| Conjunction::from_key(key))
}

impl Serialize for BackendGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.conjunction.as_str(), &self.children)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for BackendGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| {
            de::Error::custom("condition group must have exactly one of `and` or `or`")
        })
    }
}

impl<'de> Deserialize<'de> for BackendNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| de::Error::custom("condition group payload must be an array"))
    }
}
