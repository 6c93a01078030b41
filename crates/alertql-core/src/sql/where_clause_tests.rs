//! Tests for WHERE clause rendering.

use super::{
    generate_where_clause, render_predicate, where_clause_from_json, ColumnTypes, FieldSchema,
};
use crate::condition::{GroupNode, Operator, Predicate};
use serde_json::json;

fn age_types() -> ColumnTypes {
    let mut types = ColumnTypes::new();
    types.insert("age".to_string(), FieldSchema::new("Int64"));
    types.insert("city".to_string(), FieldSchema::new("Utf8"));
    types
}

#[test]
fn test_single_condition_is_quoted() {
    let tree = json!({"label": "AND", "items": [{"column": "age", "operator": ">", "value": 30}]});

    assert_eq!(where_clause_from_json(&tree, &age_types()), "WHERE age > '30'");
}

#[test]
fn test_nested_group_uses_outer_label_between_siblings() {
    // Arrange
    let tree = json!({
        "label": "and",
        "items": [
            {"column": "age", "operator": ">", "value": 30},
            {"label": "or", "items": [
                {"column": "city", "operator": "=", "value": "delhi"},
                {"column": "city", "operator": "=", "value": "mumbai"}
            ]}
        ]
    });

    // Act
    let clause = where_clause_from_json(&tree, &age_types());

    // Assert
    assert_eq!(
        clause,
        "WHERE age > '30' AND (city = 'delhi' OR city = 'mumbai')"
    );
}

#[test]
fn test_deeply_nested_groups_each_get_parentheses() {
    let tree = json!({
        "label": "or",
        "items": [
            {"column": "a", "operator": "=", "value": 1},
            {"label": "and", "items": [
                {"column": "b", "operator": "=", "value": 2},
                {"label": "or", "items": [
                    {"column": "c", "operator": "=", "value": 3},
                    {"column": "d", "operator": "!=", "value": 4}
                ]}
            ]}
        ]
    });

    assert_eq!(
        where_clause_from_json(&tree, &ColumnTypes::new()),
        "WHERE a = '1' OR (b = '2' AND (c = '3' OR d != '4'))"
    );
}

#[test]
fn test_missing_tree_yields_empty() {
    assert_eq!(generate_where_clause(None, &age_types()), "");
    assert_eq!(where_clause_from_json(&json!(null), &age_types()), "");
}

#[test]
fn test_incomplete_item_blanks_whole_clause() {
    let missing_column = json!({"label": "and", "items": [
        {"column": "age", "operator": ">", "value": 30},
        {"column": "", "operator": "=", "value": "x"}
    ]});
    let missing_operator = json!({"label": "and", "items": [
        {"column": "age", "operator": ">", "value": 30},
        {"label": "or", "items": [{"column": "city", "value": "x"}]}
    ]});

    assert_eq!(where_clause_from_json(&missing_column, &age_types()), "");
    assert_eq!(where_clause_from_json(&missing_operator, &age_types()), "");
}

#[test]
fn test_empty_root_yields_empty() {
    let tree = json!({"label": "and", "items": []});
    assert_eq!(where_clause_from_json(&tree, &age_types()), "");
}

#[test]
fn test_contains_operators_case_insensitive() {
    let types = ColumnTypes::new();
    for op in ["contains", "Contains"] {
        let predicate = Predicate::new("msg", Operator::from(op), "err");
        assert_eq!(
            render_predicate(&predicate, &types).as_deref(),
            Some("msg LIKE '%err%'"),
            "operator {op}"
        );
    }
    for op in ["not_contains", "NotContains"] {
        let predicate = Predicate::new("msg", Operator::from(op), "err");
        assert_eq!(
            render_predicate(&predicate, &types).as_deref(),
            Some("msg NOT LIKE '%err%'"),
            "operator {op}"
        );
    }
}

#[test]
fn test_numeric_column_still_quoted() {
    let predicate = Predicate::new("age", Operator::Gte, 18.5);
    assert_eq!(
        render_predicate(&predicate, &age_types()).as_deref(),
        Some("age >= '18.5'")
    );
}

#[test]
fn test_null_and_bool_values() {
    let types = ColumnTypes::new();
    let null = Predicate::new("a", Operator::Eq, serde_json::Value::Null);
    let flag = Predicate::new("b", Operator::NotEq, true);

    assert_eq!(render_predicate(&null, &types).as_deref(), Some("a = ''"));
    assert_eq!(render_predicate(&flag, &types).as_deref(), Some("b != 'true'"));
}

#[test]
fn test_typed_tree_matches_json_entry_point() {
    let json = json!({"groupId": "r", "label": "or", "items": [
        {"id": "1", "column": "level", "operator": "=", "value": "error"},
        {"id": "2", "column": "level", "operator": "=", "value": "warn"}
    ]});
    let tree = GroupNode::from_json(&json).unwrap();

    let typed = generate_where_clause(Some(&tree), &ColumnTypes::new());

    assert_eq!(typed, "WHERE level = 'error' OR level = 'warn'");
    assert_eq!(typed, where_clause_from_json(&json, &ColumnTypes::new()));
}

#[test]
fn test_field_schema_numeric_detection() {
    assert!(FieldSchema::new("Int64").is_numeric());
    assert!(FieldSchema::new("UInt8").is_numeric());
    assert!(FieldSchema::new("Float64").is_numeric());
    assert!(!FieldSchema::new("Utf8").is_numeric());
    assert!(!FieldSchema::new("Boolean").is_numeric());
}
