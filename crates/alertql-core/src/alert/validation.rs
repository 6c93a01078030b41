//! Submission checks for the alert form.
//!
//! Each failure carries the message shown to the user; the first failing
//! check wins.

use thiserror::Error;

use crate::condition::{ConditionItem, GroupNode, Operator};
use crate::cron::CronExpression;

use super::{AlertForm, FormNumber, FrequencyType, QueryType, StreamType, TriggerCondition};

/// Characters the backend does not accept in alert names.
const FORBIDDEN_NAME_CHARS: &[char] = &[':', '#', '?', '&', '%', '\'', '"', '/'];

/// A failed submission check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Form field the failure relates to.
    pub field: String,
    /// User-facing message.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl AlertForm {
    /// Runs every submission check and returns the coerced trigger.
    pub fn validate(&self) -> Result<TriggerCondition, ValidationError> {
        self.validate_identity()?;
        self.validate_query()?;
        let trigger = self.coerce_trigger()?;
        if self.destinations.iter().all(|d| d.trim().is_empty()) {
            return Err(ValidationError::new(
                "destinations",
                "At least one destination is required",
            ));
        }
        if self.context_attributes.keys().any(|k| k.trim().is_empty()) {
            return Err(ValidationError::new(
                "context_attributes",
                "Context attribute keys cannot be empty",
            ));
        }
        Ok(trigger)
    }

    fn validate_identity(&self) -> Result<(), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::new("name", "Alert name is required"));
        }
        if name.chars().any(|c| c.is_whitespace() || FORBIDDEN_NAME_CHARS.contains(&c)) {
            return Err(ValidationError::new(
                "name",
                "Alert name cannot contain spaces or any of : # ? & % ' \" /",
            ));
        }
        if self.stream_name.trim().is_empty() {
            return Err(ValidationError::new("stream_name", "Stream name is required"));
        }
        Ok(())
    }

    fn validate_query(&self) -> Result<(), ValidationError> {
        let query = &self.query_condition;
        if self.is_real_time && query.query_type != QueryType::Custom {
            return Err(ValidationError::new(
                "query_condition.type",
                "Real-time alerts only support custom conditions",
            ));
        }
        match query.query_type {
            QueryType::Custom => {
                if let Some(tree) = &query.conditions {
                    check_tree(tree)?;
                }
            }
            QueryType::Sql => {
                if query.sql.trim().is_empty() {
                    return Err(ValidationError::new(
                        "query_condition.sql",
                        "SQL query is required",
                    ));
                }
            }
            QueryType::Promql => {
                if self.stream_type != StreamType::Metrics {
                    return Err(ValidationError::new(
                        "query_condition.type",
                        "PromQL is only available for metrics streams",
                    ));
                }
                if query.promql.trim().is_empty() {
                    return Err(ValidationError::new(
                        "query_condition.promql",
                        "PromQL query is required",
                    ));
                }
                if query.promql_condition.is_none() {
                    return Err(ValidationError::new(
                        "query_condition.promql_condition",
                        "PromQL condition is required",
                    ));
                }
            }
        }

        if let Some(aggregation) = &query.aggregation {
            if aggregation.function.trim().is_empty() {
                return Err(ValidationError::new(
                    "query_condition.aggregation.function",
                    "Aggregation function is required",
                ));
            }
            if aggregation.having.column.trim().is_empty() {
                return Err(ValidationError::new(
                    "query_condition.aggregation.having.column",
                    "Aggregation column is required",
                ));
            }
        }
        Ok(())
    }

    fn coerce_trigger(&self) -> Result<TriggerCondition, ValidationError> {
        let trigger = &self.trigger_condition;

        if !is_comparison(&trigger.operator) {
            return Err(ValidationError::new(
                "trigger_condition.operator",
                "Trigger operator must be one of =, !=, >=, <=, >, <",
            ));
        }
        let threshold = trigger.threshold.as_f64().ok_or_else(|| {
            ValidationError::new("trigger_condition.threshold", "Threshold should be a number")
        })?;
        let silence = if trigger.silence.is_blank() {
            0
        } else {
            non_negative(&trigger.silence).ok_or_else(|| {
                ValidationError::new(
                    "trigger_condition.silence",
                    "Silence notification should be zero or a positive number of minutes",
                )
            })?
        };

        // Real-time alerts are evaluated on ingest; the schedule is unused.
        if self.is_real_time {
            return Ok(TriggerCondition {
                period: trigger.period.as_i64().unwrap_or(0),
                operator: trigger.operator.clone(),
                frequency: trigger.frequency.as_i64().unwrap_or(0),
                cron: String::new(),
                threshold,
                silence,
                frequency_type: trigger.frequency_type,
                timezone: trigger.timezone.clone(),
            });
        }

        let period = positive(&trigger.period).ok_or_else(|| {
            ValidationError::new(
                "trigger_condition.period",
                "Period should be a positive number of minutes",
            )
        })?;

        let (frequency, cron) = match trigger.frequency_type {
            FrequencyType::Minutes => {
                let frequency = positive(&trigger.frequency).ok_or_else(|| {
                    ValidationError::new(
                        "trigger_condition.frequency",
                        "Frequency should be a positive number of minutes",
                    )
                })?;
                (frequency, String::new())
            }
            FrequencyType::Cron => {
                let expression = CronExpression::parse(&trigger.cron).map_err(|err| {
                    ValidationError::new(
                        "trigger_condition.cron",
                        format!("Invalid cron expression: {err}"),
                    )
                })?;
                if trigger.timezone.as_deref().is_none_or(|tz| tz.trim().is_empty()) {
                    return Err(ValidationError::new(
                        "trigger_condition.timezone",
                        "Timezone is required for cron schedules",
                    ));
                }
                (trigger.frequency.as_i64().unwrap_or(0), expression.to_string())
            }
        };

        Ok(TriggerCondition {
            period,
            operator: trigger.operator.clone(),
            frequency,
            cron,
            threshold,
            silence,
            frequency_type: trigger.frequency_type,
            timezone: trigger.timezone.clone(),
        })
    }
}

fn check_tree(group: &GroupNode) -> Result<(), ValidationError> {
    for item in &group.items {
        match item {
            ConditionItem::Leaf(leaf) if !leaf.predicate.is_complete() => {
                return Err(ValidationError::new(
                    "query_condition.conditions",
                    "Every condition needs a column and an operator",
                ));
            }
            ConditionItem::Leaf(_) => {}
            ConditionItem::Group(nested) => check_tree(nested)?,
        }
    }
    Ok(())
}

fn is_comparison(operator: &Operator) -> bool {
    matches!(
        operator,
        Operator::Eq | Operator::NotEq | Operator::Gte | Operator::Lte | Operator::Gt | Operator::Lt
    )
}

fn positive(number: &FormNumber) -> Option<i64> {
    number.as_i64().filter(|n| *n > 0)
}

fn non_negative(number: &FormNumber) -> Option<i64> {
    number.as_i64().filter(|n| *n >= 0)
}
