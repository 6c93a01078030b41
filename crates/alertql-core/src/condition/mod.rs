//! Alert condition trees.
//!
//! A condition tree is a recursive AND/OR group of leaf predicates. It has
//! two shapes:
//!
//! - the **UI tree** ([`GroupNode`]), which carries client-only ids used
//!   to render and remove items,
//! - the **backend tree** ([`BackendGroup`]), the persisted wire format
//!   where each group is an object with exactly one `and` or `or` key.
//!
//! # JSON Format
//!
//! ```json
//! { "groupId": "g1", "label": "or", "items": [
//!     { "id": "c1", "column": "level", "operator": "=", "value": "error", "ignore_case": true },
//!     { "groupId": "g2", "label": "and", "items": [ ... ] }
//! ]}
//! ```
//!
//! becomes, on the wire,
//!
//! ```json
//! { "or": [
//!     { "column": "level", "operator": "=", "value": "error", "ignore_case": true },
//!     { "and": [ ... ] }
//! ]}
//! ```

pub mod backend;
mod editor;
mod ids;
mod transform;


use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

pub use backend::{BackendGroup, BackendNode};
pub use editor::EditError;
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use transform::{backend_json_to_ui, ui_json_to_backend};

/// Client-only identifier of a leaf or group.
///
/// Generated on creation or when a tree is rebuilt from the backend form.
/// Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UiId(String);

impl UiId {
    /// Creates an id from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UiId {
    // Ids minted by other clients may be numeric; anything non-scalar is dropped.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Self(s),
            Value::Number(n) => Self(n.to_string()),
            _ => Self::default(),
        })
    }
}

/// Logical connective of a condition group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Conjunction {
    /// All children must hold.
    And,
    /// At least one child must hold.
    #[default]
    Or,
}

impl Conjunction {
    /// Parses a UI label, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }

    /// Parses a backend wire key. Only the exact lowercase keys are accepted.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }

    /// Returns the lowercase label used by both tree shapes.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Returns the SQL keyword joining sibling clauses.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Returns the other connective.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }
}

impl Serialize for Conjunction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Conjunction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::parse(&label)
            .ok_or_else(|| de::Error::custom(format!("unknown group label `{label}`")))
    }
}

/// Comparison operator of a leaf predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// Substring match, rendered as `LIKE '%v%'`.
    Contains,
    /// Negated substring match, rendered as `NOT LIKE '%v%'`.
    NotContains,
    /// Any other operator, kept verbatim. An empty string means unset.
    Other(String),
}

impl Operator {
    /// The operator of a predicate whose operator field is missing.
    #[must_use]
    pub fn unset() -> Self {
        Self::Other(String::new())
    }

    /// Returns true when no operator was given.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Other(op) if op.trim().is_empty())
    }

    /// Returns the operator as written on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Contains => "Contains",
            Self::NotContains => "NotContains",
            Self::Other(op) => op,
        }
    }
}

impl From<&str> for Operator {
    fn from(op: &str) -> Self {
        match op {
            "=" => Self::Eq,
            "!=" => Self::NotEq,
            ">=" => Self::Gte,
            "<=" => Self::Lte,
            ">" => Self::Gt,
            "<" => Self::Lt,
            other => {
                let folded: String = other
                    .chars()
                    .filter(|c| *c != '_')
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                match folded.as_str() {
                    "contains" => Self::Contains,
                    "notcontains" => Self::NotContains,
                    _ => Self::Other(other.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let op = String::deserialize(deserializer)?;
        Ok(Self::from(op.as_str()))
    }
}

/// The persisted part of a leaf condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Column (stream field) the predicate applies to.
    #[serde(default)]
    pub column: String,
    /// Comparison operator.
    #[serde(default = "Operator::unset")]
    pub operator: Operator,
    /// Right-hand side, a string or a number.
    #[serde(default)]
    pub value: Value,
    /// Case-insensitive comparison flag, evaluated by the backend.
    #[serde(default)]
    pub ignore_case: bool,
}

impl Predicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
            ignore_case: false,
        }
    }

    /// Sets the case-insensitive flag.
    #[must_use]
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Reads a predicate field by field, substituting defaults for
    /// anything missing or mistyped.
    #[must_use]
    pub fn from_json_lossy(value: &Value) -> Self {
        Self {
            column: value
                .get("column")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            operator: value
                .get("operator")
                .and_then(Value::as_str)
                .map_or_else(Operator::unset, Operator::from),
            value: value.get("value").cloned().unwrap_or(Value::Null),
            ignore_case: value
                .get("ignore_case")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// Returns true when both the column and the operator are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.column.trim().is_empty() && !self.operator.is_blank()
    }
}

/// A leaf of the UI tree.
///
/// Leaves are read field by field: a missing or mistyped field takes its
/// default, and the leaf is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafCondition {
    /// Client-only id.
    pub id: UiId,
    /// The persisted predicate.
    #[serde(flatten)]
    pub predicate: Predicate,
}

impl LeafCondition {
    /// Wraps a predicate with a freshly generated id.
    pub fn new(predicate: Predicate, ids: &mut dyn IdGenerator) -> Self {
        Self {
            id: ids.next_id(),
            predicate,
        }
    }

    /// Reads a leaf, substituting defaults for anything missing or mistyped.
    #[must_use]
    pub fn from_json_lossy(value: &Value) -> Self {
        Self {
            id: value
                .get("id")
                .and_then(|id| UiId::deserialize(id).ok())
                .unwrap_or_default(),
            predicate: Predicate::from_json_lossy(value),
        }
    }
}

impl<'de> Deserialize<'de> for LeafCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(de::Error::custom("condition must be an object"));
        }
        Ok(Self::from_json_lossy(&value))
    }
}

/// A group of the UI tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNode {
    /// Client-only id.
    #[serde(rename = "groupId")]
    pub group_id: UiId,
    /// Connective joining `items`.
    pub label: Conjunction,
    /// Leaves and nested groups.
    pub items: Vec<ConditionItem>,
}

impl GroupNode {
    /// Creates an empty group with a freshly generated id.
    pub fn new(label: Conjunction, ids: &mut dyn IdGenerator) -> Self {
        Self {
            group_id: ids.next_id(),
            label,
            items: Vec::new(),
        }
    }

    /// Reads a UI tree from loosely-typed JSON.
    ///
    /// Returns `None` for `null`, non-objects, a missing or unknown label,
    /// a missing `items` array, or a descendant that is neither a leaf
    /// object nor a well-formed group. Mistyped leaf fields are defaulted.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        match Self::deserialize(value) {
            Ok(group) => Some(group),
            Err(err) => {
                tracing::debug!("Rejected condition group: {err}");
                None
            }
        }
    }

    /// Returns true when the group has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of group levels below this one (0 for a group of leaves).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.items
            .iter()
            .filter_map(ConditionItem::as_group)
            .map(|group| group.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Total number of leaves in the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                ConditionItem::Leaf(_) => 1,
                ConditionItem::Group(group) => group.leaf_count(),
            })
            .sum()
    }
}

/// An item of a UI group: a leaf or a nested group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConditionItem {
    /// Leaf predicate.
    Leaf(LeafCondition),
    /// Nested group.
    Group(GroupNode),
}

impl ConditionItem {
    /// Returns the nested group, if this item is one.
    #[must_use]
    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Self::Group(group) => Some(group),
            Self::Leaf(_) => None,
        }
    }

    /// Returns the id of the leaf or group.
    #[must_use]
    pub fn id(&self) -> &UiId {
        match self {
            Self::Leaf(leaf) => &leaf.id,
            Self::Group(group) => &group.group_id,
        }
    }
}

impl<'de> Deserialize<'de> for GroupNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let label = value
            .get("label")
            .ok_or_else(|| de::Error::missing_field("label"))?;
        let label = Conjunction::deserialize(label).map_err(de::Error::custom)?;
        let items = value
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| de::Error::custom("condition group `items` must be an array"))?;
        let items = items
            .iter()
            .map(ConditionItem::deserialize)
            .collect::<Result<Vec<_>, _>>()
            .map_err(de::Error::custom)?;

        Ok(Self {
            group_id: value
                .get("groupId")
                .and_then(|id| UiId::deserialize(id).ok())
                .unwrap_or_default(),
            label,
            items,
        })
    }
}

impl<'de> Deserialize<'de> for ConditionItem {
    // An item is a group exactly when it carries an `items` array.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.get("items").is_some_and(Value::is_array) {
            GroupNode::deserialize(value)
                .map(Self::Group)
                .map_err(de::Error::custom)
        } else {
            LeafCondition::deserialize(value)
                .map(Self::Leaf)
                .map_err(de::Error::custom)
        }
    }
}

impl From<LeafCondition> for ConditionItem {
    fn from(leaf: LeafCondition) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<GroupNode> for ConditionItem {
    fn from(group: GroupNode) -> Self {
        Self::Group(group)
    }
}
