//! UTC-normalized instants.
//!
//! `TimeValue` is the single time representation used throughout the crate.
//! It is a plain `Copy` value: every arithmetic operation returns a new
//! instant, so a recurrence walk can never alias the instant it stored in an
//! earlier occurrence.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use chrono::{
    DateTime, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
    Timelike, Utc,
};
use serde::{Deserialize, Serialize};

use crate::error::{TtError, TtResult};

/// Timestamp format used by recurrence rule text (`UNTIL`, `EXDATE`).
pub const FIXED_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Bare date format accepted as a fallback for `UNTIL`/`EXDATE` values.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Calendar-aware step used when advancing an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

/// An instant, always stored in UTC. Ordering is by the underlying instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeValue(DateTime<Utc>);

impl TimeValue {
    pub fn now() -> Self {
        TimeValue(Utc::now())
    }

    /// Interpret `ms` as milliseconds since 1970-01-01T00:00:00Z.
    ///
    /// Values outside chrono's representable range saturate to its bounds.
    pub fn from_epoch_millis(ms: i64) -> Self {
        let dt = DateTime::from_timestamp_millis(ms).unwrap_or(if ms < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
        TimeValue(dt)
    }

    /// Build from a native date/time. Naive values are taken as already UTC;
    /// zoned values are converted.
    pub fn from_native(value: impl Into<TimeValue>) -> Self {
        value.into()
    }

    /// Parse `YYYYMMDDThhmmssZ`.
    pub fn parse_fixed(s: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(s.trim(), FIXED_FORMAT)
            .ok()
            .map(Self::from)
    }

    /// Parse a bare `YYYYMMDD` date as midnight UTC.
    pub fn parse_date(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .ok()
            .map(|d| Self::from(d.and_time(NaiveTime::MIN)))
    }

    /// Parse rule text: fixed timestamp first, bare date second.
    pub fn parse_rule_value(s: &str) -> Option<Self> {
        Self::parse_fixed(s).or_else(|| Self::parse_date(s))
    }

    pub fn to_epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn to_native(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn to_fixed_string(&self) -> String {
        self.0.format(FIXED_FORMAT).to_string()
    }

    /// The same instant with sub-second precision dropped, which is all the
    /// fixed rule format can express.
    pub fn whole_seconds(&self) -> Self {
        TimeValue(self.0.with_nanosecond(0).unwrap_or(self.0))
    }

    /// Add `period * repeats`. Months and years use calendar arithmetic,
    /// clamping to the last day of a shorter month.
    pub fn advance(&self, period: Period, repeats: u32) -> Self {
        let n = i64::from(repeats);
        let advanced = match period {
            Period::Day => Duration::try_days(n).and_then(|d| self.0.checked_add_signed(d)),
            Period::Week => Duration::try_weeks(n).and_then(|d| self.0.checked_add_signed(d)),
            Period::Month => self.0.checked_add_months(Months::new(repeats)),
            Period::Year => repeats
                .checked_mul(12)
                .and_then(|months| self.0.checked_add_months(Months::new(months))),
        };
        TimeValue(advanced.unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Midnight UTC of the same day.
    pub fn start_of_day(&self) -> Self {
        TimeValue(self.0.date_naive().and_time(NaiveTime::MIN).and_utc())
    }
}

impl From<NaiveDateTime> for TimeValue {
    fn from(value: NaiveDateTime) -> Self {
        TimeValue(value.and_utc())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimeValue {
    fn from(value: DateTime<Tz>) -> Self {
        TimeValue(value.with_timezone(&Utc))
    }
}

impl Add<Duration> for TimeValue {
    type Output = TimeValue;

    fn add(self, rhs: Duration) -> TimeValue {
        TimeValue(
            self.0
                .checked_add_signed(rhs)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }
}

impl Sub<Duration> for TimeValue {
    type Output = TimeValue;

    fn sub(self, rhs: Duration) -> TimeValue {
        TimeValue(
            self.0
                .checked_sub_signed(rhs)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        )
    }
}

impl Sub for TimeValue {
    type Output = Duration;

    fn sub(self, rhs: TimeValue) -> Duration {
        self.0 - rhs.0
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl FromStr for TimeValue {
    type Err = TtError;

    /// Accepts RFC 3339, `YYYYMMDDThhmmssZ`, `YYYY-MM-DD` or `YYYYMMDD`.
    fn from_str(s: &str) -> TtResult<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
            return Ok(dt.into());
        }
        if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            return Ok(date.and_time(NaiveTime::MIN).into());
        }
        Self::parse_rule_value(s)
            .ok_or_else(|| TtError::Validation(format!("Unrecognised timestamp '{}'", s)))
    }
}
