//! Tests for loading alerts into the form and building the submit payload.

use super::{Alert, AlertForm, FormNumber, FrequencyType, QueryType, StreamType};
use crate::condition::{ConditionItem, Conjunction, GroupNode, Operator, SequentialIds, UiId};
use serde_json::json;

fn loaded_alert() -> Alert {
    serde_json::from_value(json!({
        "name": "cpu_high",
        "stream_name": "default",
        "stream_type": "metrics",
        "is_real_time": false,
        "query_condition": {
            "type": "custom",
            "conditions": {"or": [
                {"column": "level", "operator": "=", "value": "error", "ignore_case": false},
                {"and": [
                    {"column": "host", "operator": "contains", "value": "web", "ignore_case": true}
                ]}
            ]}
        },
        "trigger_condition": {
            "period": 10, "operator": ">=", "frequency": 5, "threshold": 3, "silence": 10
        },
        "destinations": ["slack"],
        "enabled": true,
        "createdAt": "2024-05-01T10:00:00+00:00",
        "lastTriggeredAt": 1_714_557_600_000_000_i64
    }))
    .unwrap()
}

fn valid_form() -> AlertForm {
    let mut form = AlertForm::new(Conjunction::And, &mut SequentialIds::default());
    form.name = "cpu_high".to_string();
    form.stream_name = "default".to_string();
    form.destinations = vec!["slack".to_string()];
    form.query_condition.conditions = GroupNode::from_json(&json!({
        "groupId": "root",
        "label": "and",
        "items": [
            {"id": "c1", "column": "level", "operator": "=", "value": "error"},
            {"groupId": "g1", "label": "or", "items": []}
        ]
    }));
    form
}

#[test]
fn test_new_form_defaults() {
    let form = AlertForm::new(Conjunction::Or, &mut SequentialIds::default());

    let tree = form.query_condition.conditions.as_ref().unwrap();
    assert_eq!(tree.label, Conjunction::Or);
    assert_eq!(tree.group_id, UiId::new("id-1"));
    assert_eq!(tree.items[0].id(), &UiId::new("id-2"));
    assert_eq!(form.query_condition.query_type, QueryType::Custom);
    assert_eq!(form.trigger_condition.period, FormNumber::from(10));
    assert_eq!(form.trigger_condition.operator, Operator::Gte);
    assert!(form.enabled);
    assert!(!form.is_aggregation_enabled());
}

#[test]
fn test_from_payload_assigns_fresh_ids() {
    // Given
    let alert = loaded_alert();
    let mut ids = SequentialIds::new("n");

    // When
    let form = AlertForm::from_payload(alert, Conjunction::Or, &mut ids);

    // Then: pre-order ids, operators normalized
    let tree = form.query_condition.conditions.as_ref().unwrap();
    assert_eq!(tree.group_id, UiId::new("n-1"));
    assert_eq!(tree.label, Conjunction::Or);
    assert_eq!(tree.items[0].id(), &UiId::new("n-2"));
    let ConditionItem::Group(nested) = &tree.items[1] else {
        panic!("expected nested group");
    };
    assert_eq!(nested.group_id, UiId::new("n-3"));
    assert_eq!(nested.label, Conjunction::And);
    let ConditionItem::Leaf(leaf) = &nested.items[0] else {
        panic!("expected leaf");
    };
    assert_eq!(leaf.id, UiId::new("n-4"));
    assert_eq!(leaf.predicate.operator, Operator::Contains);
    assert_eq!(form.stream_type, StreamType::Metrics);
    assert_eq!(form.trigger_condition.frequency, FormNumber::from(5));
}

#[test]
fn test_from_payload_without_tree_gets_blank_root() {
    let mut alert = loaded_alert();
    alert.query_condition.conditions = None;

    let form = AlertForm::from_payload(alert, Conjunction::And, &mut SequentialIds::default());

    let tree = form.query_condition.conditions.unwrap();
    assert_eq!(tree.label, Conjunction::And);
    assert_eq!(tree.leaf_count(), 1);
}

#[test]
fn test_empty_backend_tree_reads_as_none() {
    let alert: Alert = serde_json::from_value(json!({
        "name": "a",
        "stream_name": "s",
        "query_condition": {"type": "custom", "conditions": {}},
        "trigger_condition": {"period": 1, "operator": ">=", "frequency": 1, "threshold": 1}
    }))
    .unwrap();

    assert!(alert.query_condition.conditions.is_none());
}

#[test]
fn test_into_payload_converts_tree_and_drops_empty_groups() {
    let payload = valid_form().into_payload("ops@example.com").unwrap();

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(
        json["query_condition"]["conditions"],
        json!({"and": [
            {"column": "level", "operator": "=", "value": "error", "ignore_case": false}
        ]})
    );
    assert_eq!(json["lastEditedBy"], "ops@example.com");
    assert!(json.get("createdAt").is_none());
}

#[test]
fn test_into_payload_coerces_trigger_numbers() {
    let mut form = valid_form();
    form.trigger_condition.period = FormNumber::from("15");
    form.trigger_condition.threshold = FormNumber::from("2.5");
    form.trigger_condition.silence = FormNumber::from("");

    let payload = form.into_payload("").unwrap();

    assert_eq!(payload.trigger_condition.period, 15);
    assert_eq!(payload.trigger_condition.threshold, 2.5);
    assert_eq!(payload.trigger_condition.silence, 0);
    assert_eq!(payload.trigger_condition.frequency_type, FrequencyType::Minutes);
    assert_eq!(payload.last_edited_by, None);
}

#[test]
fn test_sql_query_omits_conditions() {
    let mut form = valid_form();
    form.query_condition.query_type = QueryType::Sql;
    form.query_condition.sql = "SELECT * FROM \"default\"".to_string();

    let payload = form.into_payload("me").unwrap();

    assert!(payload.query_condition.conditions.is_none());
    let json = serde_json::to_value(&payload).unwrap();
    assert!(json["query_condition"].get("conditions").is_none());
}

#[test]
fn test_trimmed_name_and_invalid_form() {
    let mut form = valid_form();
    form.name = "  cpu_high ".to_string();
    assert_eq!(form.clone().into_payload("me").unwrap().name, "cpu_high");

    form.destinations.clear();
    let err = form.into_payload("me").unwrap_err();
    assert_eq!(err.field, "destinations");
}

#[test]
fn test_edit_round_trip_keeps_server_fields() {
    // Arrange
    let alert = loaded_alert();
    let created_at = alert.created_at;

    // Act
    let mut form = AlertForm::from_payload(alert, Conjunction::Or, &mut SequentialIds::default());
    form.description = "edited".to_string();
    let payload = form.into_payload("me").unwrap();

    // Assert
    assert_eq!(payload.created_at, created_at);
    assert_eq!(payload.last_triggered_at, Some(1_714_557_600_000_000));
    assert_eq!(payload.description, "edited");
    assert_eq!(
        payload.query_condition.conditions.unwrap().to_json(),
        json!({"or": [
            {"column": "level", "operator": "=", "value": "error", "ignore_case": false},
            {"and": [
                {"column": "host", "operator": "Contains", "value": "web", "ignore_case": true}
            ]}
        ]})
    );
}

fn custom_form_json(conditions: serde_json::Value) -> serde_json::Value {
    json!({
        "name": "error_spike",
        "stream_name": "default",
        "destinations": ["email"],
        "query_condition": {"type": "custom", "conditions": conditions}
    })
}

#[test]
fn test_mistyped_leaf_field_keeps_filter_on_submit() {
    // Given: a leaf whose flag is not a boolean
    let value = custom_form_json(json!({"groupId": "root", "label": "and", "items": [
        {"id": "c1", "column": "level", "operator": "=", "value": "error", "ignore_case": "yes"},
        {"id": "c2", "column": "host", "operator": "=", "value": "web"}
    ]}));

    // When
    let form = AlertForm::from_json(&value).unwrap();
    let payload = form.into_payload("me").unwrap();

    // Then: both leaves are submitted
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(
        json["query_condition"]["conditions"],
        json!({"and": [
            {"column": "level", "operator": "=", "value": "error", "ignore_case": false},
            {"column": "host", "operator": "=", "value": "web", "ignore_case": false}
        ]})
    );
}

#[test]
fn test_malformed_custom_tree_blocks_submission() {
    let value = custom_form_json(json!({"label": "xor", "items": [
        {"id": "c1", "column": "level", "operator": "=", "value": "error"}
    ]}));

    let err = AlertForm::from_json(&value).unwrap_err();

    assert_eq!(err.field, "query_condition.conditions");
    assert!(err.message.starts_with("Condition tree is malformed"));
}

#[test]
fn test_malformed_custom_tree_is_a_deserialize_error() {
    let value = custom_form_json(json!({"label": "and", "items": "level = error"}));

    assert!(serde_json::from_value::<AlertForm>(value).is_err());
}

#[test]
fn test_absent_custom_tree_reads_as_none() {
    for conditions in [json!(null), json!({})] {
        let form = AlertForm::from_json(&custom_form_json(conditions)).unwrap();
        assert!(form.query_condition.conditions.is_none());
    }
}

#[test]
fn test_from_json_reports_other_shape_errors_on_form() {
    let err = AlertForm::from_json(&json!({"stream_type": "queue"})).unwrap_err();
    assert_eq!(err.field, "form");
}
