//! Aggregation query assembly for the alert preview chart.

use crate::alert::{Aggregation, AlertForm};
use crate::config::SqlConfig;

use super::where_clause::{generate_where_clause, ColumnTypes};

/// Builds preview queries with configurable column names and aliases.
#[derive(Debug, Clone, Default)]
pub struct SqlPreview {
    config: SqlConfig,
}

impl SqlPreview {
    /// Creates a builder from configuration.
    #[must_use]
    pub fn new(config: SqlConfig) -> Self {
        Self { config }
    }

    /// Assembles the histogram query for an alert form.
    ///
    /// ```text
    /// SELECT histogram(_timestamp) AS zo_sql_key, <agg> as zo_sql_val
    ///   [, concat(<group by>) as x_axis_2]
    /// FROM "<stream>" <where> GROUP BY zo_sql_key [, x_axis_2] ORDER BY zo_sql_key ASC
    /// ```
    ///
    /// The aggregation is `COUNT(*)` when aggregation is disabled or has no
    /// function.
    #[must_use]
    pub fn query(&self, form: &AlertForm, column_types: &ColumnTypes) -> String {
        let SqlConfig {
            timestamp_column,
            key_alias,
            value_alias,
            group_alias,
        } = &self.config;

        let aggregation = form.query_condition.aggregation.as_ref();
        let group_by = aggregation.map(group_by_columns).unwrap_or_default();
        let (extra_select, extra_group) = if group_by.is_empty() {
            (String::new(), String::new())
        } else {
            (
                format!(", concat({}) as {group_alias}", group_by.join(", ")),
                format!(", {group_alias}"),
            )
        };

        let where_clause =
            generate_where_clause(form.query_condition.conditions.as_ref(), column_types);

        format!(
            "SELECT histogram({timestamp_column}) AS {key_alias}, {} as {value_alias}{extra_select} \
             FROM \"{}\" {where_clause} GROUP BY {key_alias}{extra_group} ORDER BY {key_alias} ASC",
            aggregate_expr(aggregation),
            form.stream_name,
        )
    }
}

/// Assembles the preview query with the default configuration.
#[must_use]
pub fn generate_sql_query(form: &AlertForm, column_types: &ColumnTypes) -> String {
    SqlPreview::default().query(form, column_types)
}

fn group_by_columns(aggregation: &Aggregation) -> Vec<&str> {
    aggregation
        .group_by
        .iter()
        .map(|column| column.trim())
        .filter(|column| !column.is_empty())
        .collect()
}

fn aggregate_expr(aggregation: Option<&Aggregation>) -> String {
    let Some(aggregation) = aggregation.filter(|agg| !agg.function.trim().is_empty()) else {
        return "COUNT(*)".to_string();
    };
    let function = aggregation.function.trim();
    let column = &aggregation.having.column;

    match percentile_fraction(function) {
        Some(fraction) => format!("approx_percentile_cont({column}, {fraction})"),
        None => format!("{function}({column})"),
    }
}

/// `p95` -> `0.95`; `None` for anything that is not `p` followed by digits.
fn percentile_fraction(function: &str) -> Option<f64> {
    let digits = function.strip_prefix(['p', 'P'])?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let percent: u32 = digits.parse().ok()?;
    Some(f64::from(percent) / 100.0)
}
