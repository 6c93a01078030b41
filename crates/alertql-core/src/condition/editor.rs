//! In-place editing of the UI tree.

use serde_json::Value;
use thiserror::Error;

use super::{
    ConditionItem, Conjunction, GroupNode, IdGenerator, LeafCondition, Operator, Predicate, UiId,
};

/// Errors raised by tree edits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// No group with the given id exists in the tree.
    #[error("condition group `{0}` not found")]
    GroupNotFound(UiId),

    /// Adding the group would nest deeper than allowed.
    #[error("condition groups cannot be nested more than {max} levels deep")]
    DepthExceeded {
        /// Configured maximum nesting level.
        max: usize,
    },
}

impl LeafCondition {
    /// A blank condition as offered to the user: no column, `=`, empty
    /// value, case-insensitive.
    pub fn blank(ids: &mut dyn IdGenerator) -> Self {
        let predicate = Predicate::new("", Operator::Eq, Value::String(String::new()))
            .with_ignore_case(true);
        Self::new(predicate, ids)
    }
}

impl GroupNode {
    /// The tree of a new alert: one blank condition under a root group.
    pub fn with_blank_condition(label: Conjunction, ids: &mut dyn IdGenerator) -> Self {
        let mut root = Self::new(label, ids);
        root.items.push(LeafCondition::blank(ids).into());
        root
    }

    /// Finds a group by id, including `self`.
    #[must_use]
    pub fn find_group(&self, group_id: &UiId) -> Option<&GroupNode> {
        if &self.group_id == group_id {
            return Some(self);
        }
        self.items
            .iter()
            .filter_map(ConditionItem::as_group)
            .find_map(|group| group.find_group(group_id))
    }

    /// Finds a group by id, including `self`, with its nesting level
    /// relative to `self`.
    fn find_group_mut(
        &mut self,
        group_id: &UiId,
        level: usize,
    ) -> Option<(&mut GroupNode, usize)> {
        if &self.group_id == group_id {
            return Some((self, level));
        }
        self.items.iter_mut().find_map(|item| match item {
            ConditionItem::Group(group) => group.find_group_mut(group_id, level + 1),
            ConditionItem::Leaf(_) => None,
        })
    }

    /// Appends a blank condition to the given group and returns its id.
    pub fn add_condition(
        &mut self,
        group_id: &UiId,
        ids: &mut dyn IdGenerator,
    ) -> Result<UiId, EditError> {
        let (group, _) = self
            .find_group_mut(group_id, 0)
            .ok_or_else(|| EditError::GroupNotFound(group_id.clone()))?;
        let leaf = LeafCondition::blank(ids);
        let id = leaf.id.clone();
        group.items.push(leaf.into());
        Ok(id)
    }

    /// Appends a nested group holding one blank condition and returns the
    /// new group's id.
    ///
    /// `max_depth` bounds the nesting level of the new group, the root
    /// being level 0.
    pub fn add_group(
        &mut self,
        parent_id: &UiId,
        label: Conjunction,
        max_depth: usize,
        ids: &mut dyn IdGenerator,
    ) -> Result<UiId, EditError> {
        let (parent, level) = self
            .find_group_mut(parent_id, 0)
            .ok_or_else(|| EditError::GroupNotFound(parent_id.clone()))?;
        if level + 1 > max_depth {
            return Err(EditError::DepthExceeded { max: max_depth });
        }
        let group = Self::with_blank_condition(label, ids);
        let id = group.group_id.clone();
        parent.items.push(group.into());
        Ok(id)
    }

    /// Flips the label of the given group between AND and OR.
    pub fn toggle_label(&mut self, group_id: &UiId) -> Result<Conjunction, EditError> {
        let (group, _) = self
            .find_group_mut(group_id, 0)
            .ok_or_else(|| EditError::GroupNotFound(group_id.clone()))?;
        group.label = group.label.toggled();
        Ok(group.label)
    }

    /// Removes the leaf or nested group with the given id.
    ///
    /// A nested group left without items is removed from its parent in
    /// turn, up to (not including) `self`. Returns whether anything was
    /// removed.
    pub fn remove_item(&mut self, id: &UiId) -> bool {
        if let Some(pos) = self.items.iter().position(|item| item.id() == id) {
            self.items.remove(pos);
            return true;
        }

        for pos in 0..self.items.len() {
            let ConditionItem::Group(group) = &mut self.items[pos] else {
                continue;
            };
            if group.remove_item(id) {
                if group.is_empty() {
                    self.items.remove(pos);
                }
                return true;
            }
        }
        false
    }
}
