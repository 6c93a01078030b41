//! Alert evaluation history requests and responses.
//!
//! # JSON Format
//!
//! ```json
//! {"alert_id": "cpu_high", "start_time": 1700000000000000, "end_time": 1700003600000000, "size": 50}
//! ```
//!
//! Times are microseconds since the epoch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A page of history for one alert within a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Alert to fetch history for.
    pub alert_id: String,
    /// Window start, microseconds since the epoch.
    pub start_time: i64,
    /// Window end, microseconds since the epoch.
    pub end_time: i64,
    /// Page size.
    pub size: usize,
    /// Offset of the first hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,
}

impl HistoryQuery {
    /// Builds a query for `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimeWindow`] when `start` is after `end` or the
    /// alert id is blank.
    pub fn for_window(
        alert_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        size: usize,
    ) -> Result<Self> {
        let alert_id = alert_id.into();
        if alert_id.trim().is_empty() {
            return Err(Error::TimeWindow("alert id is required".to_string()));
        }
        if start > end {
            return Err(Error::TimeWindow(format!(
                "start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self {
            alert_id,
            start_time: start.timestamp_micros(),
            end_time: end.timestamp_micros(),
            size,
            from: None,
        })
    }

    /// The window ending at `end` and reaching back `minutes`.
    ///
    /// # Errors
    ///
    /// Same as [`HistoryQuery::for_window`]; negative spans are rejected.
    pub fn last_minutes(
        alert_id: impl Into<String>,
        end: DateTime<Utc>,
        minutes: i64,
        size: usize,
    ) -> Result<Self> {
        let span = chrono::Duration::try_minutes(minutes)
            .filter(|span| *span >= chrono::Duration::zero())
            .ok_or_else(|| Error::TimeWindow(format!("invalid span of {minutes} minutes")))?;
        let start = end
            .checked_sub_signed(span)
            .ok_or_else(|| Error::TimeWindow(format!("invalid span of {minutes} minutes")))?;
        Self::for_window(alert_id, start, end, size)
    }

    /// Sets the page offset.
    #[must_use]
    pub fn with_offset(mut self, from: usize) -> Self {
        self.from = Some(from);
        self
    }
}

/// One recorded evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryHit {
    /// Evaluation time, microseconds since the epoch.
    pub timestamp: i64,
    /// Outcome such as `firing`, `ok` or `error`.
    #[serde(default)]
    pub status: String,
    /// Wall time of the evaluation.
    #[serde(default)]
    pub evaluation_took_in_secs: Option<f64>,
    /// Time spent in the search query.
    #[serde(default)]
    pub query_took: Option<i64>,
    /// Evaluation error, if any.
    #[serde(default)]
    pub error: Option<String>,
    /// Real-time alert evaluation.
    #[serde(default)]
    pub is_realtime: bool,
    /// Notification was muted by the silence period.
    #[serde(default)]
    pub is_silenced: bool,
}

impl HistoryHit {
    /// Evaluation time, or `None` when out of range.
    #[must_use]
    pub fn triggered_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.timestamp)
    }

    /// Returns true when the evaluation failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty()) || self.status == "error"
    }
}

/// History search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Matching evaluations, newest first.
    #[serde(default)]
    pub hits: Vec<HistoryHit>,
    /// Total matches across all pages.
    #[serde(default)]
    pub total: usize,
}
