//! Conversions between the UI tree and the backend tree.
//!
//! Both directions are total: malformed input yields `None` (or `{}` at
//! the JSON boundary), never an error.

use serde_json::{Map, Value};

use super::backend::{BackendGroup, BackendNode};
use super::{ConditionItem, GroupNode, IdGenerator, LeafCondition};

impl GroupNode {
    /// Converts the UI tree to the backend tree, dropping UI ids.
    ///
    /// Nested groups without items are omitted. Returns `None` when
    /// nothing remains, which callers treat as "no condition" rather than
    /// as an empty AND.
    #[must_use]
    pub fn to_backend(&self) -> Option<BackendGroup> {
        let children: Vec<BackendNode> = self
            .items
            .iter()
            .filter_map(|item| match item {
                ConditionItem::Group(group) => group.to_backend().map(BackendNode::Group),
                ConditionItem::Leaf(leaf) => Some(BackendNode::Leaf(leaf.predicate.clone())),
            })
            .collect();

        if children.is_empty() {
            None
        } else {
            Some(BackendGroup::new(self.label, children))
        }
    }

    /// Rebuilds a UI tree from the backend tree.
    ///
    /// Every group and leaf gets a fresh id from `ids`, in pre-order.
    pub fn from_backend(group: &BackendGroup, ids: &mut dyn IdGenerator) -> Self {
        let group_id = ids.next_id();
        let items = group
            .children
            .iter()
            .map(|child| match child {
                BackendNode::Group(nested) => {
                    ConditionItem::Group(Self::from_backend(nested, ids))
                }
                BackendNode::Leaf(predicate) => {
                    ConditionItem::Leaf(LeafCondition::new(predicate.clone(), ids))
                }
            })
            .collect();

        Self {
            group_id,
            label: group.conjunction,
            items,
        }
    }
}

/// Converts a loosely-typed UI tree to backend JSON.
///
/// Returns an empty object for `null`, malformed input, or a tree without
/// items; callers omit the filter in that case.
#[must_use]
pub fn ui_json_to_backend(ui: &Value) -> Value {
    GroupNode::from_json(ui)
        .and_then(|group| group.to_backend())
        .map_or_else(|| Value::Object(Map::new()), |group| group.to_json())
}

/// Rebuilds a UI tree from loosely-typed backend JSON.
///
/// Returns `None` for `null`, non-objects, and objects that do not have
/// exactly one `and`/`or` key.
pub fn backend_json_to_ui(backend: &Value, ids: &mut dyn IdGenerator) -> Option<GroupNode> {
    let group = BackendGroup::from_json(backend)?;
    Some(GroupNode::from_backend(&group, ids))
}
