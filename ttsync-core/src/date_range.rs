//! Time windows for fetches and queries.

use chrono::Duration;

use crate::constants::{DEFAULT_LOOKAHEAD_WEEKS, DEFAULT_LOOKBACK_WEEKS};
use crate::time::{Period, TimeValue};

/// Inclusive `[since, until]` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub since: TimeValue,
    pub until: TimeValue,
}

impl DateRange {
    pub fn new(since: TimeValue, until: TimeValue) -> Self {
        DateRange { since, until }
    }

    /// Default fetch window: a year before the calendar existed, through an
    /// effectively unbounded future.
    pub fn default_for(created: TimeValue, now: TimeValue) -> Self {
        DateRange {
            since: created - Duration::weeks(DEFAULT_LOOKBACK_WEEKS),
            until: now + Duration::weeks(DEFAULT_LOOKAHEAD_WEEKS),
        }
    }

    /// Fill in whichever bound is missing from the default window.
    pub fn from_bounds(
        since: Option<TimeValue>,
        until: Option<TimeValue>,
        created: TimeValue,
        now: TimeValue,
    ) -> Self {
        let default = Self::default_for(created, now);
        DateRange {
            since: since.unwrap_or(default.since),
            until: until.unwrap_or(default.until),
        }
    }

    pub fn contains(&self, instant: TimeValue) -> bool {
        self.since <= instant && instant <= self.until
    }

    /// Widen to whole days: `since` down to midnight, `until` up to the
    /// following midnight.
    pub fn round_to_day(&self) -> Self {
        DateRange {
            since: self.since.start_of_day(),
            until: self.until.start_of_day().advance(Period::Day, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeValue {
        s.parse().unwrap()
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::new(t("2024-01-01T00:00:00Z"), t("2024-01-02T00:00:00Z"));
        assert!(range.contains(t("2024-01-01T00:00:00Z")));
        assert!(range.contains(t("2024-01-02T00:00:00Z")));
        assert!(!range.contains(t("2024-01-02T00:00:01Z")));
    }

    #[test]
    fn rounding_widens_to_whole_days() {
        let range = DateRange::new(t("2024-01-01T13:45:00Z"), t("2024-01-03T08:00:00Z"));
        assert_eq!(
            range.round_to_day(),
            DateRange::new(t("2024-01-01T00:00:00Z"), t("2024-01-04T00:00:00Z"))
        );
    }

    #[test]
    fn default_window() {
        let created = t("2020-01-01T00:00:00Z");
        let now = t("2024-01-01T00:00:00Z");
        let range = DateRange::from_bounds(None, Some(t("2025-01-01T00:00:00Z")), created, now);

        assert_eq!(range.since, t("2019-01-02T00:00:00Z"));
        assert_eq!(range.until, t("2025-01-01T00:00:00Z"));
        assert_eq!(
            DateRange::default_for(created, now).until,
            now + Duration::weeks(1000)
        );
    }
}
