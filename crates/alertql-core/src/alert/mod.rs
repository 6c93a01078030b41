//! Alert resource payload and the UI-side alert form.
//!
//! [`Alert`] is what the create/update call sends and what an edit-load
//! receives; its condition tree is in backend form. [`AlertForm`] is the
//! editing session's state: the condition tree is in UI form and trigger
//! numbers may still be strings typed by the user.

mod form;
pub mod history;
mod number;
mod validation;

#[cfg(test)]
mod form_tests;

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::{BackendGroup, GroupNode, Operator};

pub use form::{AlertForm, TriggerForm};
pub use history::{HistoryHit, HistoryQuery, HistoryResponse};
pub use number::FormNumber;
pub use validation::ValidationError;

/// Kind of stream an alert queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    /// Log streams.
    #[default]
    Logs,
    /// Metric streams.
    Metrics,
    /// Trace streams.
    Traces,
}

/// How the alert query is expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Condition tree built in the editor.
    #[default]
    Custom,
    /// Hand-written SQL.
    Sql,
    /// PromQL, metrics streams only.
    Promql,
}

/// How scheduled evaluation is timed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyType {
    /// Every `frequency` minutes.
    #[default]
    Minutes,
    /// On a cron schedule.
    Cron,
}

/// `column operator value` comparison used by HAVING and PromQL conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCondition {
    /// Column the comparison applies to.
    #[serde(default)]
    pub column: String,
    /// Comparison operator.
    #[serde(default = "Operator::unset")]
    pub operator: Operator,
    /// Right-hand side.
    #[serde(default)]
    pub value: Value,
}

impl Default for ValueCondition {
    fn default() -> Self {
        Self {
            column: String::new(),
            operator: Operator::Gte,
            value: Value::from(1),
        }
    }
}

/// Aggregation settings. Absent when aggregation is disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Extra group-by columns; blank entries are ignored.
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Aggregate function (`avg`, `sum`, `p95`, ...).
    #[serde(default)]
    pub function: String,
    /// Aggregated column and its threshold comparison.
    #[serde(default)]
    pub having: ValueCondition,
}

/// Comparison window shifted back in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeShift {
    /// Offset such as `15m` or `1d`.
    #[serde(rename = "offSet", default)]
    pub offset: String,
}

/// A condition tree read from the `conditions` field.
pub trait ConditionTree: Sized {
    /// Reads a present, non-empty tree.
    ///
    /// `Ok(None)` drops the tree; an error rejects the whole document.
    fn from_tree_json(value: &Value) -> Result<Option<Self>, String>;
}

impl ConditionTree for GroupNode {
    // Malformed editor trees are errors, never `None`.
    fn from_tree_json(value: &Value) -> Result<Option<Self>, String> {
        GroupNode::deserialize(value)
            .map(Some)
            .map_err(|err| format!("invalid condition tree: {err}"))
    }
}

impl ConditionTree for BackendGroup {
    fn from_tree_json(value: &Value) -> Result<Option<Self>, String> {
        Ok(BackendGroup::from_json(value))
    }
}

/// Returns true for `null` and `{}`, which both mean "no condition".
fn is_absent_tree(value: &Value) -> bool {
    value.is_null() || value.as_object().is_some_and(serde_json::Map::is_empty)
}

fn deserialize_tree<'de, D, C>(deserializer: D) -> Result<Option<C>, D::Error>
where
    D: Deserializer<'de>,
    C: ConditionTree,
{
    let value = Value::deserialize(deserializer)?;
    if is_absent_tree(&value) {
        return Ok(None);
    }
    C::from_tree_json(&value).map_err(serde::de::Error::custom)
}

/// What the alert evaluates. `C` is the condition tree shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "C: Serialize", deserialize = "C: ConditionTree"))]
pub struct QueryCondition<C> {
    /// Query kind.
    #[serde(rename = "type", default)]
    pub query_type: QueryType,
    /// Condition tree of a custom query.
    #[serde(
        default,
        deserialize_with = "deserialize_tree",
        skip_serializing_if = "Option::is_none"
    )]
    pub conditions: Option<C>,
    /// SQL of a `sql` query.
    #[serde(default)]
    pub sql: String,
    /// PromQL of a `promql` query.
    #[serde(default)]
    pub promql: String,
    /// Threshold comparison applied to PromQL results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promql_condition: Option<ValueCondition>,
    /// Aggregation, `None` when disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    /// Optional VRL post-processing function.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrl_function: Option<String>,
    /// Additional comparison windows.
    #[serde(default)]
    pub multi_time_range: Vec<TimeShift>,
}

impl<C> Default for QueryCondition<C> {
    fn default() -> Self {
        Self {
            query_type: QueryType::default(),
            conditions: None,
            sql: String::new(),
            promql: String::new(),
            promql_condition: None,
            aggregation: None,
            vrl_function: None,
            multi_time_range: Vec::new(),
        }
    }
}

impl<C> QueryCondition<C> {
    /// Carries every field over, replacing the condition tree.
    fn map_conditions<T>(self, f: impl FnOnce(Option<C>) -> Option<T>) -> QueryCondition<T> {
        QueryCondition {
            query_type: self.query_type,
            conditions: f(self.conditions),
            sql: self.sql,
            promql: self.promql,
            promql_condition: self.promql_condition,
            aggregation: self.aggregation,
            vrl_function: self.vrl_function,
            multi_time_range: self.multi_time_range,
        }
    }
}

/// When the alert fires, with all numbers coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCondition {
    /// Evaluation window in minutes.
    pub period: i64,
    /// Comparison of the result count against `threshold`.
    pub operator: Operator,
    /// Evaluation interval in minutes.
    pub frequency: i64,
    /// Cron schedule, used when `frequency_type` is `cron`.
    #[serde(default)]
    pub cron: String,
    /// Threshold the result is compared against.
    pub threshold: f64,
    /// Minutes to mute notifications after firing.
    #[serde(default)]
    pub silence: i64,
    /// Interval or cron scheduling.
    #[serde(default)]
    pub frequency_type: FrequencyType,
    /// Timezone the cron schedule is evaluated in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Alert resource as sent to and received from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert name.
    pub name: String,
    /// Queried stream.
    pub stream_name: String,
    /// Kind of the queried stream.
    #[serde(default)]
    pub stream_type: StreamType,
    /// Evaluated on ingest instead of on a schedule.
    #[serde(default)]
    pub is_real_time: bool,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// What is evaluated, with the condition tree in backend form.
    #[serde(default)]
    pub query_condition: QueryCondition<BackendGroup>,
    /// When the alert fires.
    pub trigger_condition: TriggerCondition,
    /// Names of notification destinations.
    #[serde(default)]
    pub destinations: Vec<String>,
    /// Extra key/value pairs passed to notification templates.
    #[serde(default)]
    pub context_attributes: BTreeMap<String, String>,
    /// Whether the alert is evaluated at all.
    #[serde(default)]
    pub enabled: bool,
    /// Creator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Last user to save the alert.
    #[serde(
        rename = "lastEditedBy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_edited_by: Option<String>,
    /// Creation time.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<FixedOffset>>,
    /// Last firing, in microseconds since the epoch.
    #[serde(
        rename = "lastTriggeredAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_triggered_at: Option<i64>,
}
