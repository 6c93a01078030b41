//! Tests for preview query assembly.

use super::{generate_sql_query, ColumnTypes, SqlPreview};
use crate::alert::{Aggregation, AlertForm, ValueCondition};
use crate::condition::{Conjunction, GroupNode, SequentialIds};
use crate::config::SqlConfig;
use serde_json::json;

fn form(stream: &str) -> AlertForm {
    let mut form = AlertForm::new(Conjunction::Or, &mut SequentialIds::default());
    form.stream_name = stream.to_string();
    form
}

fn aggregation(function: &str, column: &str, group_by: &[&str]) -> Aggregation {
    Aggregation {
        group_by: group_by.iter().map(ToString::to_string).collect(),
        function: function.to_string(),
        having: ValueCondition {
            column: column.to_string(),
            ..ValueCondition::default()
        },
    }
}

#[test]
fn test_disabled_aggregation_counts_rows() {
    // Given: a new form whose only condition is still blank
    let form = form("default");

    // When
    let sql = generate_sql_query(&form, &ColumnTypes::new());

    // Then: COUNT(*) and no WHERE clause
    assert_eq!(
        sql,
        "SELECT histogram(_timestamp) AS zo_sql_key, COUNT(*) as zo_sql_val \
         FROM \"default\"  GROUP BY zo_sql_key ORDER BY zo_sql_key ASC"
    );
}

#[test]
fn test_blank_function_counts_rows() {
    let mut form = form("default");
    form.query_condition.aggregation = Some(aggregation("  ", "latency", &[]));

    let sql = generate_sql_query(&form, &ColumnTypes::new());

    assert!(sql.contains("COUNT(*) as zo_sql_val"));
}

#[test]
fn test_percentile_function() {
    let mut form = form("traces");
    form.query_condition.aggregation = Some(aggregation("p95", "latency", &[]));

    let sql = generate_sql_query(&form, &ColumnTypes::new());

    assert!(sql.contains("approx_percentile_cont(latency, 0.95) as zo_sql_val"));
}

#[test]
fn test_percentile_variants() {
    let mut form = form("traces");
    for (function, expected) in [
        ("p50", "approx_percentile_cont(latency, 0.5)"),
        ("p99", "approx_percentile_cont(latency, 0.99)"),
        ("avg", "avg(latency)"),
        ("pfoo", "pfoo(latency)"),
    ] {
        form.query_condition.aggregation = Some(aggregation(function, "latency", &[]));
        let sql = generate_sql_query(&form, &ColumnTypes::new());
        assert!(
            sql.contains(&format!("{expected} as zo_sql_val")),
            "{function}: {sql}"
        );
    }
}

#[test]
fn test_group_by_adds_concat_column() {
    let mut form = form("default");
    form.query_condition.aggregation = Some(aggregation("avg", "latency", &["c1", "c2"]));

    let sql = generate_sql_query(&form, &ColumnTypes::new());

    assert_eq!(
        sql,
        "SELECT histogram(_timestamp) AS zo_sql_key, avg(latency) as zo_sql_val, \
         concat(c1, c2) as x_axis_2 FROM \"default\"  \
         GROUP BY zo_sql_key, x_axis_2 ORDER BY zo_sql_key ASC"
    );
}

#[test]
fn test_empty_or_blank_group_by_adds_nothing() {
    let mut form = form("default");
    for group_by in [&[][..], &["", "  "][..]] {
        form.query_condition.aggregation = Some(aggregation("sum", "bytes", group_by));
        let sql = generate_sql_query(&form, &ColumnTypes::new());
        assert!(!sql.contains("x_axis_2"), "{sql}");
    }
}

#[test]
fn test_where_clause_included() {
    let mut form = form("default");
    form.query_condition.conditions = GroupNode::from_json(&json!({
        "label": "and",
        "items": [{"column": "level", "operator": "=", "value": "error"}]
    }));

    let sql = generate_sql_query(&form, &ColumnTypes::new());

    assert_eq!(
        sql,
        "SELECT histogram(_timestamp) AS zo_sql_key, COUNT(*) as zo_sql_val \
         FROM \"default\" WHERE level = 'error' GROUP BY zo_sql_key ORDER BY zo_sql_key ASC"
    );
}

#[test]
fn test_configured_aliases() {
    let preview = SqlPreview::new(SqlConfig {
        timestamp_column: "ts".to_string(),
        key_alias: "k".to_string(),
        value_alias: "v".to_string(),
        group_alias: "g".to_string(),
    });
    let mut form = form("s");
    form.query_condition.aggregation = Some(aggregation("max", "x", &["host"]));

    let sql = preview.query(&form, &ColumnTypes::new());

    assert_eq!(
        sql,
        "SELECT histogram(ts) AS k, max(x) as v, concat(host) as g FROM \"s\"  \
         GROUP BY k, g ORDER BY k ASC"
    );
}
