//! Master events, their occurrences, and the entry type handed to callers.
//!
//! A `MasterEvent` is one record as sourced from the server, possibly
//! recurring. An `Occurrence` is a transient projection of one instant of a
//! recurring master, computed on every windowed query and never stored.

use std::cmp::Ordering;

use chrono::{Datelike, Duration};

use crate::error::{TtError, TtResult};
use crate::recurrence::RecurrenceRule;
use crate::remote::protocol::RawEvent;
use crate::time::{Period, TimeValue};

#[derive(Debug, Clone, PartialEq)]
pub struct MasterEvent {
    pub id: String,
    /// Id of the owning calendar.
    pub parent_id: String,
    pub label_id: Option<String>,
    pub author_id: Option<String>,
    pub title: String,
    start: TimeValue,
    end: TimeValue,
    duration_ms: i64,
    /// Server-side last-modified marker.
    pub updated: TimeValue,
    pub all_day: bool,
    /// Present iff the event recurs.
    pub recurrence: Option<RecurrenceRule>,
    pub deleted: bool,
    pub deleted_time: Option<TimeValue>,
}

impl MasterEvent {
    /// Build from a raw server record.
    ///
    /// Fails with `Validation` when `id`, `calendar_id` or `start_at` is
    /// missing, and with `MalformedRule` when the recurrence text is unusable.
    pub fn from_raw(raw: &RawEvent) -> TtResult<Self> {
        let id = raw
            .id
            .clone()
            .ok_or_else(|| TtError::Validation("event record has no id".into()))?;
        let parent_id = raw
            .calendar_id
            .clone()
            .ok_or_else(|| TtError::Validation(format!("event '{}' has no calendar_id", id)))?;
        let start_ms = raw
            .start_at
            .ok_or_else(|| TtError::Validation(format!("event '{}' has no start_at", id)))?;

        let start = TimeValue::from_epoch_millis(start_ms);
        let mut end = raw.end_at.map_or(start, TimeValue::from_epoch_millis);
        if raw.all_day {
            // Up to, but not including, the start of the following day
            end = end.advance(Period::Day, 1) - Duration::milliseconds(1);
        }

        let recurrence = match raw.recurrences.as_deref() {
            Some(lines) if !lines.is_empty() => Some(RecurrenceRule::parse(lines)?),
            _ => None,
        };

        Ok(MasterEvent {
            id,
            parent_id,
            label_id: raw.label_id.clone(),
            author_id: raw.author_id.clone(),
            title: raw.title.clone().unwrap_or_default(),
            start,
            end,
            duration_ms: (end - start).num_milliseconds(),
            updated: TimeValue::from_epoch_millis(raw.updated_at.unwrap_or(0)),
            all_day: raw.all_day,
            recurrence,
            deleted: false,
            deleted_time: None,
        })
    }

    pub fn start(&self) -> TimeValue {
        self.start
    }

    pub fn end(&self) -> TimeValue {
        self.end
    }

    /// `end - start` in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    pub fn set_times(&mut self, start: TimeValue, end: TimeValue) {
        self.start = start;
        self.end = end;
        self.duration_ms = (end - start).num_milliseconds();
    }

    pub fn recurs(&self) -> bool {
        self.recurrence.is_some()
    }

    pub(crate) fn mark_deleted(&mut self, at: TimeValue) {
        self.deleted = true;
        self.deleted_time = Some(at);
    }

    /// Concrete occurrences whose start lies in `[window_start, window_end]`.
    ///
    /// Returns nothing for non-recurring events. Output is ascending by start.
    pub fn expand(&self, window_start: TimeValue, window_end: TimeValue) -> Vec<Occurrence> {
        let Some(rule) = &self.recurrence else {
            return Vec::new();
        };
        if window_start > window_end
            || rule.until.is_some_and(|until| until < window_start)
            || self.start > window_end
        {
            return Vec::new();
        }

        let last_start = match rule.until {
            Some(until) => until.min(window_end),
            None => window_end,
        };
        let (period, interval) = rule.step();
        let duration = Duration::milliseconds(self.duration_ms);

        let mut occurrences = Vec::new();
        let mut previous: Option<TimeValue> = None;
        let mut step = first_step(self.start, window_start, period, interval);

        loop {
            let Some(repeats) = step.checked_mul(interval) else {
                break;
            };
            let candidate = self.start.advance(period, repeats);
            // Saturated arithmetic stops making progress at the end of time
            if candidate > last_start || previous.is_some_and(|p| candidate <= p) {
                break;
            }
            if candidate >= window_start {
                if rule.is_exception(&candidate) {
                    tracing::trace!(id = %self.id, at = %candidate.to_fixed_string(), "skipping exception");
                } else {
                    occurrences.push(Occurrence {
                        parent_id: self.id.clone(),
                        start: candidate,
                        end: candidate + duration,
                        title: self.title.clone(),
                    });
                }
            }
            previous = Some(candidate);
            step += 1;
        }

        occurrences
    }
}

/// Lower bound on the step index of the first candidate at or after
/// `window_start`. Never skips a candidate inside the window.
fn first_step(start: TimeValue, window_start: TimeValue, period: Period, interval: u32) -> u32 {
    if window_start <= start {
        return 0;
    }
    let gap = window_start - start;
    let periods = match period {
        Period::Day => gap.num_days(),
        Period::Week => gap.num_weeks(),
        Period::Month | Period::Year => {
            let (from, to) = (start.to_native(), window_start.to_native());
            let months = (i64::from(to.year()) - i64::from(from.year())) * 12
                + i64::from(to.month0())
                - i64::from(from.month0())
                - 1;
            if period == Period::Year {
                months / 12
            } else {
                months
            }
        }
    };
    let steps = periods.max(0) / i64::from(interval);
    u32::try_from(steps).unwrap_or(u32::MAX)
}

/// One instant of a recurring master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Id of the recurring master this was expanded from.
    pub parent_id: String,
    pub start: TimeValue,
    pub end: TimeValue,
    pub title: String,
}

/// A query result: either a plain event or an occurrence of a recurring one.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarEntry<'a> {
    Simple(&'a MasterEvent),
    Occurrence(Occurrence),
}

impl CalendarEntry<'_> {
    pub fn start(&self) -> TimeValue {
        match self {
            CalendarEntry::Simple(event) => event.start(),
            CalendarEntry::Occurrence(occurrence) => occurrence.start,
        }
    }

    pub fn end(&self) -> TimeValue {
        match self {
            CalendarEntry::Simple(event) => event.end(),
            CalendarEntry::Occurrence(occurrence) => occurrence.end,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            CalendarEntry::Simple(event) => &event.title,
            CalendarEntry::Occurrence(occurrence) => &occurrence.title,
        }
    }

    /// Id of the master event backing this entry.
    pub fn master_id(&self) -> &str {
        match self {
            CalendarEntry::Simple(event) => &event.id,
            CalendarEntry::Occurrence(occurrence) => &occurrence.parent_id,
        }
    }

    pub fn is_occurrence(&self) -> bool {
        matches!(self, CalendarEntry::Occurrence(_))
    }
}

/// Order entries by start, then end. Stable for equal instants.
pub fn sort_chronologically(entries: &mut [CalendarEntry<'_>]) {
    entries.sort_by(|a, b| match a.start().cmp(&b.start()) {
        Ordering::Equal => a.end().cmp(&b.end()),
        other => other,
    });
}
