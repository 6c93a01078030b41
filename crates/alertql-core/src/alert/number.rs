//! Numbers as typed into form inputs.

use serde::{Deserialize, Serialize};

/// A numeric form field that may hold a JSON number or the raw text the
/// user typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormNumber {
    /// Already a number.
    Number(serde_json::Number),
    /// Text, coerced on submission.
    Text(String),
}

impl FormNumber {
    /// Returns the value as a finite float, or `None` if the text is not
    /// a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => n.as_f64()?,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Returns the value as an integer. Floats with a fractional part are
    /// rejected.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        if let Self::Number(n) = self {
            if let Some(value) = n.as_i64() {
                return Some(value);
            }
        }
        if let Self::Text(text) = self {
            if let Ok(value) = text.trim().parse::<i64>() {
                return Some(value);
            }
        }
        let value = self.as_f64()?;
        if value.fract() != 0.0 || value.abs() >= 9.0e18 {
            return None;
        }
        // Reason: whole values within i64 range only.
        #[allow(clippy::cast_possible_truncation)]
        let whole = value as i64;
        Some(whole)
    }

    /// Returns true for empty or whitespace-only text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

impl Default for FormNumber {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<i64> for FormNumber {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for FormNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
