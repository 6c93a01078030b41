//! `WHERE` clause rendering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::{ConditionItem, GroupNode, Operator, Predicate};

/// Declared type of a stream field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Engine type name, e.g. `Utf8`, `Int64`, `Float64`.
    #[serde(rename = "type", default)]
    pub data_type: String,
}

impl FieldSchema {
    /// Creates a schema entry.
    #[must_use]
    pub fn new(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
        }
    }

    /// Returns true for integer and floating-point types.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        let ty = self.data_type.to_ascii_lowercase();
        ["int", "uint", "float", "double", "decimal"]
            .iter()
            .any(|prefix| ty.starts_with(prefix))
    }
}

/// Column name to declared type.
pub type ColumnTypes = HashMap<String, FieldSchema>;

/// Renders a UI group as a `WHERE` clause.
///
/// Siblings are joined by their parent's label; nested groups are wrapped
/// in parentheses. Returns an empty string for `None`, a group without
/// items, or a tree where any condition lacks a column or operator: no
/// partial clause is ever emitted.
#[must_use]
pub fn generate_where_clause(group: Option<&GroupNode>, column_types: &ColumnTypes) -> String {
    let Some(group) = group else {
        return String::new();
    };
    match render_group(group, column_types) {
        Some(clause) => format!("WHERE {clause}"),
        None => {
            tracing::debug!("Condition tree is incomplete, omitting WHERE clause");
            String::new()
        }
    }
}

/// Renders loosely-typed UI JSON as a `WHERE` clause.
///
/// Malformed input yields an empty string.
#[must_use]
pub fn where_clause_from_json(group: &Value, column_types: &ColumnTypes) -> String {
    generate_where_clause(GroupNode::from_json(group).as_ref(), column_types)
}

fn render_group(group: &GroupNode, column_types: &ColumnTypes) -> Option<String> {
    if group.is_empty() {
        return None;
    }
    let parts = group
        .items
        .iter()
        .map(|item| match item {
            ConditionItem::Group(nested) => {
                render_group(nested, column_types).map(|clause| format!("({clause})"))
            }
            ConditionItem::Leaf(leaf) => render_predicate(&leaf.predicate, column_types),
        })
        .collect::<Option<Vec<_>>>()?;

    Some(parts.join(&format!(" {} ", group.label.as_sql())))
}

/// Renders a single predicate, or `None` if it lacks a column or operator.
#[must_use]
pub fn render_predicate(predicate: &Predicate, column_types: &ColumnTypes) -> Option<String> {
    if !predicate.is_complete() {
        return None;
    }
    let column = &predicate.column;
    let value = literal_text(&predicate.value);

    if column_types.get(column).is_some_and(FieldSchema::is_numeric) {
        tracing::trace!(column = %column, "numeric column compared against quoted literal");
    }

    Some(match &predicate.operator {
        Operator::Contains => format!("{column} LIKE '%{value}%'"),
        Operator::NotContains => format!("{column} NOT LIKE '%{value}%'"),
        op => format!("{column} {} '{value}'", op.as_str()),
    })
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
