//! Alert editing session state and its conversion to and from the payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::{Conjunction, GroupNode, IdGenerator, Operator};

use super::{
    is_absent_tree, Alert, FormNumber, FrequencyType, QueryCondition, QueryType, StreamType,
    TriggerCondition, ValidationError,
};

/// Trigger settings as held by the form; numbers may still be text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerForm {
    /// Evaluation window in minutes.
    #[serde(default)]
    pub period: FormNumber,
    /// Comparison of the result count against `threshold`.
    #[serde(default = "default_trigger_operator")]
    pub operator: Operator,
    /// Evaluation interval in minutes.
    #[serde(default)]
    pub frequency: FormNumber,
    /// Cron schedule.
    #[serde(default)]
    pub cron: String,
    /// Threshold.
    #[serde(default)]
    pub threshold: FormNumber,
    /// Minutes to mute notifications after firing.
    #[serde(default)]
    pub silence: FormNumber,
    /// Interval or cron scheduling.
    #[serde(default)]
    pub frequency_type: FrequencyType,
    /// Timezone of the cron schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

fn default_trigger_operator() -> Operator {
    Operator::Gte
}

impl Default for TriggerForm {
    fn default() -> Self {
        Self {
            period: FormNumber::from(10),
            operator: default_trigger_operator(),
            frequency: FormNumber::from(10),
            cron: String::new(),
            threshold: FormNumber::from(3),
            silence: FormNumber::from(10),
            frequency_type: FrequencyType::Minutes,
            timezone: None,
        }
    }
}

impl From<TriggerCondition> for TriggerForm {
    fn from(trigger: TriggerCondition) -> Self {
        Self {
            period: FormNumber::from(trigger.period),
            operator: trigger.operator,
            frequency: FormNumber::from(trigger.frequency),
            cron: trigger.cron,
            threshold: serde_json::Number::from_f64(trigger.threshold)
                .map_or_else(FormNumber::default, FormNumber::Number),
            silence: FormNumber::from(trigger.silence),
            frequency_type: trigger.frequency_type,
            timezone: trigger.timezone,
        }
    }
}

/// The alert being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertForm {
    /// Unique alert name.
    #[serde(default)]
    pub name: String,
    /// Queried stream.
    #[serde(default)]
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
    /// What is evaluated, with the condition tree in UI form.
    #[serde(default)]
    pub query_condition: QueryCondition<GroupNode>,
    /// When the alert fires.
    #[serde(default)]
    pub trigger_condition: TriggerForm,
    /// Names of notification destinations.
    #[serde(default)]
    pub destinations: Vec<String>,
    /// Extra key/value pairs passed to notification templates.
    #[serde(default)]
    pub context_attributes: BTreeMap<String, String>,
    /// Whether the alert is evaluated at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Creator, carried through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Carried through unchanged from the loaded alert.
    #[serde(skip)]
    loaded: Option<LoadedMetadata>,
}

fn default_enabled() -> bool {
    true
}

/// Server-owned fields of an edited alert, returned on update untouched.
#[derive(Debug, Clone, PartialEq)]
struct LoadedMetadata {
    created_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    last_triggered_at: Option<i64>,
}

impl AlertForm {
    /// A fresh form for a new alert, with one blank condition under a
    /// root group of the given label.
    pub fn new(root_label: Conjunction, ids: &mut dyn IdGenerator) -> Self {
        Self {
            name: String::new(),
            stream_name: String::new(),
            stream_type: StreamType::default(),
            is_real_time: false,
            description: String::new(),
            query_condition: QueryCondition {
                conditions: Some(GroupNode::with_blank_condition(root_label, ids)),
                ..QueryCondition::default()
            },
            trigger_condition: TriggerForm::default(),
            destinations: Vec::new(),
            context_attributes: BTreeMap::new(),
            enabled: true,
            owner: None,
            loaded: None,
        }
    }

    /// Reads a form from loosely-typed JSON.
    ///
    /// A condition tree that is present but unreadable fails on
    /// `query_condition.conditions`; it is never read as "no condition".
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        if let Some(tree) = value.pointer("/query_condition/conditions") {
            if !is_absent_tree(tree) {
                GroupNode::deserialize(tree).map_err(|err| {
                    ValidationError::new(
                        "query_condition.conditions",
                        format!("Condition tree is malformed: {err}"),
                    )
                })?;
            }
        }
        Self::deserialize(value).map_err(|err| ValidationError::new("form", err.to_string()))
    }

    /// Loads an existing alert for editing.
    ///
    /// The backend tree is rebuilt with fresh ids. A missing tree is
    /// replaced by one blank condition under `root_label` so the editor
    /// always has something to show.
    pub fn from_payload(
        alert: Alert,
        root_label: Conjunction,
        ids: &mut dyn IdGenerator,
    ) -> Self {
        let query_condition = alert.query_condition.map_conditions(|backend| {
            Some(match backend {
                Some(group) => GroupNode::from_backend(&group, ids),
                None => GroupNode::with_blank_condition(root_label, ids),
            })
        });

        Self {
            name: alert.name,
            stream_name: alert.stream_name,
            stream_type: alert.stream_type,
            is_real_time: alert.is_real_time,
            description: alert.description,
            query_condition,
            trigger_condition: alert.trigger_condition.into(),
            destinations: alert.destinations,
            context_attributes: alert.context_attributes,
            enabled: alert.enabled,
            owner: alert.owner,
            loaded: Some(LoadedMetadata {
                created_at: alert.created_at,
                last_triggered_at: alert.last_triggered_at,
            }),
        }
    }

    /// Returns true when aggregation is switched on.
    #[must_use]
    pub fn is_aggregation_enabled(&self) -> bool {
        self.query_condition.aggregation.is_some()
    }

    /// Validates the form and builds the payload to submit.
    ///
    /// Trigger numbers are coerced, the condition tree is converted to
    /// backend form (a tree without conditions is omitted), and `editor`
    /// is recorded as the last editor.
    pub fn into_payload(self, editor: &str) -> Result<Alert, ValidationError> {
        let trigger_condition = self.validate()?;
        let uses_conditions = self.query_condition.query_type == QueryType::Custom;
        let query_condition = self.query_condition.map_conditions(|tree| {
            tree.filter(|_| uses_conditions)
                .and_then(|group| group.to_backend())
        });
        let (created_at, last_triggered_at) = self
            .loaded
            .map_or((None, None), |meta| (meta.created_at, meta.last_triggered_at));

        tracing::debug!(
            alert = %self.name,
            stream = %self.stream_name,
            "Alert form ready for submission"
        );

        Ok(Alert {
            name: self.name.trim().to_string(),
            stream_name: self.stream_name,
            stream_type: self.stream_type,
            is_real_time: self.is_real_time,
            description: self.description,
            query_condition,
            trigger_condition,
            destinations: self.destinations,
            context_attributes: self.context_attributes,
            enabled: self.enabled,
            owner: self.owner,
            last_edited_by: (!editor.is_empty()).then(|| editor.to_string()),
            created_at,
            last_triggered_at,
        })
    }
}
