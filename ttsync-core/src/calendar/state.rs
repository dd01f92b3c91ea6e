//! In-memory event state for one calendar.
//!
//! `events` and `recur_events` partition every in-scope master event by its
//! recurrence flag; an id never appears in both. Deleted events are moved to
//! `deleted_events` and kept there.

use std::collections::{HashMap, HashSet};

use crate::date_range::DateRange;
use crate::error::{TtError, TtResult};
use crate::event::{CalendarEntry, MasterEvent};
use crate::time::TimeValue;

/// Counts from applying one sync cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Records dropped because they could not be parsed.
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<MasterEvent>,
    recur_events: Vec<MasterEvent>,
    deleted_events: Vec<MasterEvent>,
    bounds: Option<DateRange>,
}

impl EventStore {
    pub fn events(&self) -> &[MasterEvent] {
        &self.events
    }

    pub fn recur_events(&self) -> &[MasterEvent] {
        &self.recur_events
    }

    pub fn deleted_events(&self) -> &[MasterEvent] {
        &self.deleted_events
    }

    pub fn bounds(&self) -> Option<DateRange> {
        self.bounds
    }

    /// True once a full fetch has been applied.
    pub fn is_populated(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn get(&self, id: &str) -> Option<&MasterEvent> {
        self.live().find(|e| e.id == id)
    }

    fn live(&self) -> impl Iterator<Item = &MasterEvent> {
        self.events.iter().chain(self.recur_events.iter())
    }

    /// Replace the held set with a full fetch.
    ///
    /// Previously held events whose id is missing from `incoming` are marked
    /// deleted at `now` and moved to `deleted_events`. Of the rest, only
    /// events starting inside `bounds` are kept in scope.
    pub fn replace_all(
        &mut self,
        mut incoming: Vec<MasterEvent>,
        bounds: DateRange,
        now: TimeValue,
    ) -> SyncStats {
        let mut stats = SyncStats::default();
        incoming.sort_by_key(|e| e.start());

        let held: Vec<MasterEvent> = std::mem::take(&mut self.events)
            .into_iter()
            .chain(std::mem::take(&mut self.recur_events))
            .collect();
        let held_ids: HashSet<String> = held.iter().map(|e| e.id.clone()).collect();

        let incoming_by_id: HashMap<&str, &MasterEvent> =
            incoming.iter().map(|e| (e.id.as_str(), e)).collect();
        for mut event in held {
            match incoming_by_id.get(event.id.as_str()) {
                Some(fresh) => {
                    if fresh.updated != event.updated {
                        stats.updated += 1;
                    }
                }
                None => {
                    tracing::debug!(id = %event.id, title = %event.title, "event no longer on server");
                    event.mark_deleted(now);
                    self.deleted_events.push(event);
                    stats.deleted += 1;
                }
            }
        }

        let (recurring, simple): (Vec<_>, Vec<_>) = incoming
            .into_iter()
            .filter(|e| bounds.contains(e.start()))
            .partition(MasterEvent::recurs);

        stats.created = simple
            .iter()
            .chain(recurring.iter())
            .filter(|e| !held_ids.contains(&e.id))
            .count();

        self.events = simple;
        self.recur_events = recurring;
        self.bounds = Some(bounds);
        stats
    }

    /// Apply a delta: upsert every incoming event updated after the newest
    /// held one, and retire `deactivated` ids.
    pub fn apply_delta(
        &mut self,
        mut incoming: Vec<MasterEvent>,
        deactivated: &[String],
        now: TimeValue,
    ) -> SyncStats {
        let mut stats = SyncStats::default();
        let newest_held = self.live().map(|e| e.updated).max();

        incoming.sort_by(|a, b| b.updated.cmp(&a.updated));
        let changed = incoming
            .into_iter()
            .take_while(|e| newest_held.is_none_or(|newest| e.updated > newest));

        for event in changed {
            match self.upsert(event) {
                Upsert::Created => stats.created += 1,
                Upsert::Updated => stats.updated += 1,
            }
        }

        for id in deactivated {
            if self.retire(id, now) {
                stats.deleted += 1;
            }
        }

        stats
    }

    /// Replace the held event with the same id, or add it. Either way the
    /// event lands in the list matching its recurrence flag, in start order.
    pub fn upsert(&mut self, event: MasterEvent) -> Upsert {
        let existed = self.take_live(&event.id).is_some();

        let list = if event.recurs() {
            &mut self.recur_events
        } else {
            &mut self.events
        };
        let at = list.partition_point(|e| e.start() <= event.start());
        list.insert(at, event);

        if existed {
            Upsert::Updated
        } else {
            Upsert::Created
        }
    }

    /// Move a live event to `deleted_events`. Returns false if not held.
    pub fn retire(&mut self, id: &str, now: TimeValue) -> bool {
        match self.take_live(id) {
            Some(mut event) => {
                event.mark_deleted(now);
                self.deleted_events.push(event);
                true
            }
            None => false,
        }
    }

    fn take_live(&mut self, id: &str) -> Option<MasterEvent> {
        if let Some(at) = self.events.iter().position(|e| e.id == id) {
            return Some(self.events.remove(at));
        }
        let at = self.recur_events.iter().position(|e| e.id == id)?;
        Some(self.recur_events.remove(at))
    }

    /// Simple events starting in the window, then each recurring master's
    /// occurrences in the window, in held order. Not globally sorted.
    pub fn events_between(
        &self,
        start: TimeValue,
        end: TimeValue,
        round_to_day: bool,
    ) -> Vec<CalendarEntry<'_>> {
        let mut window = DateRange::new(start, end);
        if round_to_day {
            window = window.round_to_day();
        }

        let simple = self
            .events
            .iter()
            .filter(|e| window.contains(e.start()))
            .map(CalendarEntry::Simple);

        let expanded = self
            .recur_events
            .iter()
            .flat_map(|e| e.expand(window.since, window.until))
            .map(CalendarEntry::Occurrence);

        simple.chain(expanded).collect()
    }

    /// The master event behind `entry`.
    pub fn master_for<'a>(&'a self, entry: &CalendarEntry<'a>) -> TtResult<&'a MasterEvent> {
        match entry {
            CalendarEntry::Simple(event) => Ok(*event),
            CalendarEntry::Occurrence(occurrence) => self
                .recur_events
                .iter()
                .find(|e| e.id == occurrence.parent_id)
                .ok_or_else(|| {
                    tracing::error!(
                        parent_id = %occurrence.parent_id,
                        "occurrence refers to a master this calendar does not hold"
                    );
                    TtError::ParentNotFound(occurrence.parent_id.clone())
                }),
        }
    }
}
