//! One remote calendar: its metadata, its events, and how they are synced.

mod state;

pub use state::{EventStore, SyncStats, Upsert};

use std::collections::HashMap;
use std::fmt;

use crate::date_range::DateRange;
use crate::error::{TtError, TtResult};
use crate::event::{CalendarEntry, MasterEvent};
use crate::remote::client::SyncClient;
use crate::remote::protocol::{RawCalendar, RawEvent};
use crate::remote::transport::{CredentialsProvider, Transport};
use crate::time::TimeValue;

/// Display data for one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub colour: String,
}

/// Result of one fetch or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied(SyncStats),
    /// The service could not be reached this cycle; state is unchanged.
    Skipped,
}

/// Parsed contents of a delta feed.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    pub events: Vec<MasterEvent>,
    /// Ids the server reports as deleted.
    pub deactivated: Vec<String>,
    pub rejected: usize,
}

impl ParsedFeed {
    /// Parse raw records, dropping (and logging) any that are unusable.
    pub fn from_records(records: Vec<serde_json::Value>) -> Self {
        let mut parsed = ParsedFeed::default();

        for record in records {
            let id = record.get("id").map(|id| id.to_string());
            match parse_record(record) {
                Ok(Record::Live(event)) => parsed.events.push(event),
                Ok(Record::Deactivated(id)) => parsed.deactivated.push(id),
                Err(e) => {
                    tracing::warn!(id = ?id, error = %e, "dropping event record");
                    parsed.rejected += 1;
                }
            }
        }

        parsed
    }
}

enum Record {
    Live(MasterEvent),
    Deactivated(String),
}

fn parse_record(record: serde_json::Value) -> TtResult<Record> {
    let raw: RawEvent =
        serde_json::from_value(record).map_err(|e| TtError::Serialization(e.to_string()))?;

    if raw.deactivated_at.is_some() {
        let id = raw
            .id
            .ok_or_else(|| TtError::Validation("deactivated record has no id".into()))?;
        return Ok(Record::Deactivated(id));
    }

    MasterEvent::from_raw(&raw).map(Record::Live)
}

pub struct Calendar<T, P> {
    pub unique_id: String,
    pub name: String,
    pub alias: Option<String>,
    pub created: TimeValue,
    /// User id to display name.
    pub known_users: HashMap<String, String>,
    /// Label id to label.
    pub label_data: HashMap<String, Label>,
    store: EventStore,
    /// Update-time cursor returned by the last successful sync.
    cursor: Option<i64>,
    client: SyncClient<T, P>,
}

impl<T: Transport, P: CredentialsProvider> Calendar<T, P> {
    pub fn new(info: RawCalendar, client: SyncClient<T, P>) -> Self {
        Calendar {
            unique_id: info.id,
            name: info.name,
            alias: info.alias_code,
            created: TimeValue::from_epoch_millis(info.created_at.unwrap_or(0)),
            known_users: info
                .calendar_users
                .into_iter()
                .map(|u| (u.id, u.name))
                .collect(),
            label_data: info
                .calendar_labels
                .into_iter()
                .map(|l| {
                    (
                        l.id,
                        Label {
                            name: l.name,
                            colour: l.color,
                        },
                    )
                })
                .collect(),
            store: EventStore::default(),
            cursor: None,
            client,
        }
    }

    /// Calendars visible to the account, each wired to a clone of `client`.
    pub async fn discover(
        client: &mut SyncClient<T, P>,
        name_filter: Option<&str>,
    ) -> TtResult<Option<Vec<Self>>>
    where
        T: Clone,
        P: Clone,
    {
        let Some(infos) = client.calendars(name_filter).await? else {
            return Ok(None);
        };
        Ok(Some(
            infos
                .into_iter()
                .map(|info| Calendar::new(info, client.clone()))
                .collect(),
        ))
    }

    pub fn events(&self) -> &[MasterEvent] {
        self.store.events()
    }

    pub fn recur_events(&self) -> &[MasterEvent] {
        self.store.recur_events()
    }

    pub fn deleted_events(&self) -> &[MasterEvent] {
        self.store.deleted_events()
    }

    /// Window currently materialised, if a fetch has completed.
    pub fn bounds(&self) -> Option<DateRange> {
        self.store.bounds()
    }

    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    /// Pull the full feed and replace the held events.
    ///
    /// Missing bounds default to a year before creation and roughly twenty
    /// years ahead. Events no longer on the server move to `deleted_events`.
    pub async fn fetch(
        &mut self,
        since: Option<TimeValue>,
        until: Option<TimeValue>,
    ) -> TtResult<SyncOutcome> {
        let now = TimeValue::now();
        let bounds = DateRange::from_bounds(since, until, self.created, now);

        let Some(feed) = self
            .client
            .events_since(&self.unique_id, self.created.to_epoch_millis())
            .await?
        else {
            return Ok(SyncOutcome::Skipped);
        };

        let parsed = ParsedFeed::from_records(feed.records);
        let mut stats = self.store.replace_all(parsed.events, bounds, now);
        stats.rejected = parsed.rejected;
        self.cursor = Some(feed.cursor);

        tracing::info!(
            calendar = %self.name,
            events = self.store.events().len(),
            recurring = self.store.recur_events().len(),
            deleted = stats.deleted,
            rejected = stats.rejected,
            "fetched calendar"
        );
        Ok(SyncOutcome::Applied(stats))
    }

    /// Pull only what changed since the last sync and merge it in.
    ///
    /// Falls back to a full `fetch` if nothing has been fetched yet.
    pub async fn refresh(&mut self) -> TtResult<SyncOutcome> {
        let Some(cursor) = self.cursor.filter(|_| self.store.is_populated()) else {
            return self.fetch(None, None).await;
        };

        let Some(feed) = self.client.events_since(&self.unique_id, cursor).await? else {
            return Ok(SyncOutcome::Skipped);
        };

        let parsed = ParsedFeed::from_records(feed.records);
        let mut stats = self
            .store
            .apply_delta(parsed.events, &parsed.deactivated, TimeValue::now());
        stats.rejected = parsed.rejected;
        self.cursor = Some(feed.cursor);

        tracing::info!(
            calendar = %self.name,
            created = stats.created,
            updated = stats.updated,
            deleted = stats.deleted,
            "refreshed calendar"
        );
        Ok(SyncOutcome::Applied(stats))
    }

    /// Add or replace one event by id.
    pub fn upsert(&mut self, event: MasterEvent) -> Upsert {
        self.store.upsert(event)
    }

    /// Entries in `[start, end]`: simple events first, then each recurring
    /// master's occurrences. Use `sort_chronologically` for a single timeline.
    pub fn events_between(
        &self,
        start: TimeValue,
        end: TimeValue,
        round_to_day: bool,
    ) -> Vec<CalendarEntry<'_>> {
        self.store.events_between(start, end, round_to_day)
    }

    /// The master event behind `entry`; `ParentNotFound` if an occurrence's
    /// master is not held.
    pub fn master_for<'a>(&'a self, entry: &CalendarEntry<'a>) -> TtResult<&'a MasterEvent> {
        self.store.master_for(entry)
    }

    pub fn label_for<'a>(&'a self, entry: &CalendarEntry<'a>) -> TtResult<Option<&'a Label>> {
        let master = self.master_for(entry)?;
        Ok(master
            .label_id
            .as_ref()
            .and_then(|id| self.label_data.get(id)))
    }

    pub fn author_for<'a>(&'a self, entry: &CalendarEntry<'a>) -> TtResult<Option<&'a str>> {
        let master = self.master_for(entry)?;
        Ok(master
            .author_id
            .as_ref()
            .and_then(|id| self.known_users.get(id))
            .map(String::as_str))
    }
}

impl<T, P> fmt::Display for Calendar<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
