//! Core library for ttsync.
//!
//! Pulls a TimeTree account's calendars over the service's private API and
//! keeps an in-memory view of their events:
//! - `time` and `recurrence` for instants and the recurrence rule subset
//! - `event` for master events and their expanded occurrences
//! - `calendar` for the synced aggregate (full fetch, delta refresh, queries)
//! - `remote` for the session-holding HTTP client

pub mod calendar;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod event;
pub mod recurrence;
pub mod remote;
pub mod time;

pub use calendar::{Calendar, Label, SyncOutcome, SyncStats};
pub use config::TtConfig;
pub use date_range::DateRange;
pub use error::{TtError, TtResult};
pub use event::{CalendarEntry, MasterEvent, Occurrence, sort_chronologically};
pub use recurrence::{Frequency, RecurrenceRule};
pub use time::{Period, TimeValue};
