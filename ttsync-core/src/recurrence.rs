//! Recurrence rule parsing.
//!
//! The server sends recurrence data as a list of strings: the first packs
//! `FREQ=...;INTERVAL=...;UNTIL=...` pairs, the rest are `EXDATE:` lines.
//! Only frequency, interval, until and exception dates drive expansion; any
//! other key is kept verbatim in `passthrough`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TtError, TtResult};
use crate::time::{Period, TimeValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn period(self) -> Period {
        match self {
            Frequency::Daily => Period::Day,
            Frequency::Weekly => Period::Week,
            Frequency::Monthly => Period::Month,
            Frequency::Yearly => Period::Year,
        }
    }
}

impl FromStr for Frequency {
    type Err = TtError;

    fn from_str(s: &str) -> TtResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(TtError::MalformedRule(format!(
                "unsupported frequency '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        };
        write!(f, "{}", s)
    }
}

/// Structured form of a server recurrence payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Multiplier on the frequency period, always >= 1.
    pub interval: u32,
    /// Inclusive upper bound on occurrence starts.
    pub until: Option<TimeValue>,
    pub exceptions: BTreeSet<TimeValue>,
    /// Rule keys that do not affect expansion (`WKST`, `BYDAY`, ...), in order.
    pub passthrough: Vec<(String, String)>,
}

impl RecurrenceRule {
    /// Parse the raw `recurrences` list of an event record.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> TtResult<Self> {
        let (rule_line, exdate_lines) = lines
            .split_first()
            .ok_or_else(|| TtError::MalformedRule("empty recurrence list".into()))?;

        let rule_text = strip_prefix_ci(rule_line.as_ref().trim(), "RRULE:");

        let mut frequency = None;
        let mut interval = 1;
        let mut until = None;
        let mut passthrough = Vec::new();

        for part in rule_text.split(';').filter(|p| !p.trim().is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                tracing::debug!(part, "ignoring recurrence rule fragment without '='");
                continue;
            };
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim();

            match key.as_str() {
                "FREQ" => frequency = Some(value.parse::<Frequency>()?),
                "INTERVAL" => interval = parse_interval(value)?,
                // An unreadable UNTIL leaves the series open-ended
                "UNTIL" => until = TimeValue::parse_rule_value(value),
                _ => passthrough.push((key, value.to_string())),
            }
        }

        let frequency = frequency
            .ok_or_else(|| TtError::MalformedRule(format!("missing FREQ in '{}'", rule_text)))?;

        let exceptions = exdate_lines
            .iter()
            .flat_map(|line| exception_values(line.as_ref()))
            .collect();

        Ok(RecurrenceRule {
            frequency,
            interval,
            until,
            exceptions,
            passthrough,
        })
    }

    /// Period and multiplier of one step of the series.
    pub fn step(&self) -> (Period, u32) {
        (self.frequency.period(), self.interval)
    }

    /// Whether `instant` is an excluded date. Compared at whole seconds,
    /// the precision of `EXDATE` text.
    pub fn is_exception(&self, instant: &TimeValue) -> bool {
        self.exceptions.contains(&instant.whole_seconds())
    }
}

fn parse_interval(value: &str) -> TtResult<u32> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(TtError::MalformedRule(format!(
            "INTERVAL must be a positive integer, got '{}'",
            value
        ))),
    }
}

/// Timestamps in an `EXDATE` line. Unparseable entries are skipped.
fn exception_values(line: &str) -> Vec<TimeValue> {
    let line = line.trim();
    // `EXDATE:v1,v2` or `EXDATE;VALUE=DATE:v1`; a bare timestamp is accepted too
    let values = match line.rsplit_once(':') {
        Some((_, values)) => values,
        None => line,
    };

    values
        .split(',')
        .filter(|v| !v.trim().is_empty())
        .filter_map(|v| {
            let parsed = TimeValue::parse_rule_value(v);
            if parsed.is_none() {
                tracing::warn!(value = v, "skipping unreadable exception date");
            }
            parsed
        })
        .collect()
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
        _ => s,
    }
}
