//! Cron schedule expressions for scheduled alerts.
//!
//! Six or seven whitespace-separated fields:
//!
//! ```text
//! sec  min  hour  day-of-month  month  day-of-week  [year]
//! ```
//!
//! Each field is `?` (day fields only) or a comma-separated list of `*`,
//! `n` or `a-b`, each optionally followed by `/step`. Months and weekdays
//! also accept three-letter names (`JAN`, `MON`), case-insensitively.


use std::fmt;

use pest::iterators::Pair;
use pest::Parser as _;
use thiserror::Error;

#[derive(pest_derive::Parser)]
#[grammar = "cron/cron.pest"]
struct CronParser;

/// A cron expression that failed to parse or is out of range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at position {position}{}", fragment_suffix(.fragment))]
pub struct CronError {
    /// Byte offset in the trimmed expression.
    pub position: usize,
    /// Offending text, if known.
    pub fragment: String,
    /// What went wrong.
    pub message: String,
}

fn fragment_suffix(fragment: &str) -> String {
    if fragment.is_empty() {
        String::new()
    } else {
        format!(" (`{fragment}`)")
    }
}

impl CronError {
    /// Creates an error at `position`.
    pub fn syntax(
        position: usize,
        fragment: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            position,
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    fn from_pest(err: &pest::error::Error<Rule>, input: &str) -> Self {
        let position = match err.location {
            pest::error::InputLocation::Pos(pos) => pos,
            pest::error::InputLocation::Span((start, _)) => start,
        };
        let fragment = input
            .get(position..)
            .unwrap_or_default()
            .split_whitespace()
            .next()
            .unwrap_or_default();
        let message = if !(6..=7).contains(&input.split_whitespace().count()) {
            "expected 6 or 7 fields".to_string()
        } else {
            err.variant.message().into_owned()
        };
        Self::syntax(position, fragment, message)
    }
}

/// Position of a field within the expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 0-59.
    Second,
    /// 0-59.
    Minute,
    /// 0-23.
    Hour,
    /// 1-31.
    DayOfMonth,
    /// 1-12 or `JAN`-`DEC`.
    Month,
    /// 0-7 (0 and 7 are Sunday) or `SUN`-`SAT`.
    DayOfWeek,
    /// 1970-2099.
    Year,
}

const MONTH_NAMES: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

const FIELD_ORDER: [FieldKind; 7] = [
    FieldKind::Second,
    FieldKind::Minute,
    FieldKind::Hour,
    FieldKind::DayOfMonth,
    FieldKind::Month,
    FieldKind::DayOfWeek,
    FieldKind::Year,
];

impl FieldKind {
    /// Field name used in error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfMonth => "day-of-month",
            Self::Month => "month",
            Self::DayOfWeek => "day-of-week",
            Self::Year => "year",
        }
    }

    /// Inclusive value bounds.
    #[must_use]
    pub const fn bounds(&self) -> (u32, u32) {
        match self {
            Self::Second | Self::Minute => (0, 59),
            Self::Hour => (0, 23),
            Self::DayOfMonth => (1, 31),
            Self::Month => (1, 12),
            Self::DayOfWeek => (0, 7),
            Self::Year => (1970, 2099),
        }
    }

    const fn allows_no_value(&self) -> bool {
        matches!(self, Self::DayOfMonth | Self::DayOfWeek)
    }

    // Value of a three-letter name, if this field has names.
    fn named_value(&self, name: &str) -> Option<u32> {
        let (names, first) = match self {
            Self::Month => (MONTH_NAMES, 1),
            Self::DayOfWeek => (WEEKDAY_NAMES, 0),
            _ => return None,
        };
        let index = names.iter().position(|n| n.eq_ignore_ascii_case(name))?;
        u32::try_from(index).ok().map(|i| i + first)
    }
}

/// Start of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronBase {
    /// `*`
    Every,
    /// `n`
    Value(u32),
    /// `a-b`
    Range(u32, u32),
}

/// One comma-separated entry of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronItem {
    /// Values the entry starts from.
    pub base: CronBase,
    /// `/step`, if given.
    pub step: Option<u32>,
}

/// A parsed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronField {
    /// `?`: no specific value.
    NoValue,
    /// Comma-separated entries.
    List(Vec<CronItem>),
}

impl CronField {
    /// Returns true when the field matches `value`.
    #[must_use]
    pub fn matches(&self, kind: FieldKind, value: u32) -> bool {
        let Self::List(items) = self else {
            return true;
        };
        let (min, max) = kind.bounds();
        items.iter().any(|item| {
            let (start, end) = match item.base {
                CronBase::Every => (min, max),
                CronBase::Value(v) if item.step.is_some() => (v, max),
                CronBase::Value(v) => (v, v),
                CronBase::Range(a, b) => (a, b),
            };
            let step = item.step.unwrap_or(1);
            value >= start && value <= end && (value - start) % step == 0
        })
    }
}

/// A validated cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    fields: Vec<CronField>,
    source: String,
}

impl CronExpression {
    /// Parses and range-checks an expression.
    ///
    /// # Errors
    ///
    /// Returns a [`CronError`] for malformed syntax, a wrong number of
    /// fields, out-of-range values, unknown names, inverted ranges, zero
    /// steps, `?` outside the day fields, or a day of month that no
    /// selected month has.
    pub fn parse(input: &str) -> Result<Self, CronError> {
        let trimmed = input.trim();
        let expression = CronParser::parse(Rule::expression, trimmed)
            .map_err(|err| CronError::from_pest(&err, trimmed))?
            .next()
            .ok_or_else(|| CronError::syntax(0, "", "empty expression"))?;

        let pairs: Vec<_> = expression
            .into_inner()
            .filter(|pair| pair.as_rule() == Rule::field)
            .collect();
        let day_of_month = pairs
            .get(3)
            .map(|pair| (pair.as_span().start(), pair.as_str().to_string()));
        let fields = pairs
            .into_iter()
            .zip(FIELD_ORDER)
            .map(|(pair, kind)| parse_field(pair, kind))
            .collect::<Result<Vec<_>, _>>()?;

        let source = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
        let parsed = Self { fields, source };
        if let Some((position, fragment)) = day_of_month {
            if !parsed.has_reachable_day() {
                return Err(CronError::syntax(
                    position,
                    fragment,
                    "day of month never occurs in the selected months",
                ));
            }
        }
        tracing::trace!(expression = %parsed.source, "Parsed cron expression");
        Ok(parsed)
    }

    // Feb 29 counts, so leap-day schedules are accepted.
    fn has_reachable_day(&self) -> bool {
        let (Some(days), Some(months)) = (
            self.field(FieldKind::DayOfMonth),
            self.field(FieldKind::Month),
        ) else {
            return true;
        };
        (1..=12)
            .filter(|month| months.matches(FieldKind::Month, *month))
            .any(|month| {
                (1..=longest_month(month)).any(|day| days.matches(FieldKind::DayOfMonth, day))
            })
    }

    /// Returns the field at `kind`, or `None` for an absent year.
    #[must_use]
    pub fn field(&self, kind: FieldKind) -> Option<&CronField> {
        let index = FIELD_ORDER.iter().position(|k| *k == kind)?;
        self.fields.get(index)
    }

    /// Returns true when a year field is present.
    #[must_use]
    pub fn has_year(&self) -> bool {
        self.fields.len() == FIELD_ORDER.len()
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for CronExpression {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

const fn longest_month(month: u32) -> u32 {
    match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Checks an expression, discarding the parse result.
///
/// # Errors
///
/// See [`CronExpression::parse`].
pub fn validate_cron(input: &str) -> Result<(), CronError> {
    CronExpression::parse(input).map(|_| ())
}

fn parse_field(pair: Pair<'_, Rule>, kind: FieldKind) -> Result<CronField, CronError> {
    let position = pair.as_span().start();
    let text = pair.as_str();
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| CronError::syntax(position, text, "empty field"))?;

    match inner.as_rule() {
        Rule::no_value if kind.allows_no_value() => Ok(CronField::NoValue),
        Rule::no_value => Err(CronError::syntax(
            position,
            text,
            format!("`?` is not allowed in the {} field", kind.as_str()),
        )),
        _ => inner
            .into_inner()
            .map(|item| parse_item(item, kind))
            .collect::<Result<Vec<_>, _>>()
            .map(CronField::List),
    }
}

fn parse_item(pair: Pair<'_, Rule>, kind: FieldKind) -> Result<CronItem, CronError> {
    let mut base = CronBase::Every;
    let mut step = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::every => base = CronBase::Every,
            Rule::value => base = CronBase::Value(parse_value(&part, kind)?),
            Rule::range => {
                let position = part.as_span().start();
                let text = part.as_str();
                let mut bounds = part.into_inner();
                let (Some(low), Some(high)) = (bounds.next(), bounds.next()) else {
                    return Err(CronError::syntax(position, text, "incomplete range"));
                };
                let (low, high) = (parse_value(&low, kind)?, parse_value(&high, kind)?);
                if low > high {
                    return Err(CronError::syntax(
                        position,
                        text,
                        format!("range start exceeds end in the {} field", kind.as_str()),
                    ));
                }
                base = CronBase::Range(low, high);
            }
            Rule::step => {
                let position = part.as_span().start();
                let text = part.as_str();
                let n = text
                    .trim_start_matches('/')
                    .parse::<u32>()
                    .map_err(|_| CronError::syntax(position, text, "invalid step"))?;
                if n == 0 {
                    return Err(CronError::syntax(position, text, "step must be at least 1"));
                }
                step = Some(n);
            }
            _ => {}
        }
    }
    Ok(CronItem { base, step })
}

fn parse_value(pair: &Pair<'_, Rule>, kind: FieldKind) -> Result<u32, CronError> {
    let position = pair.as_span().start();
    let text = pair.as_str();
    let value = match text.parse::<u32>() {
        Ok(n) => n,
        Err(_) => kind.named_value(text).ok_or_else(|| {
            CronError::syntax(
                position,
                text,
                format!("unknown name in the {} field", kind.as_str()),
            )
        })?,
    };

    let (min, max) = kind.bounds();
    if value < min || value > max {
        return Err(CronError::syntax(
            position,
            text,
            format!("{} must be between {min} and {max}", kind.as_str()),
        ));
    }
    Ok(value)
}
