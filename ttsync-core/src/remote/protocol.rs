//! Wire shapes of the calendar service's private API.
//!
//! Ids arrive as either JSON strings or numbers depending on the endpoint;
//! both are normalised to `String`.

use serde::{Deserialize, Deserializer};

/// One event record as sent by the sync feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub calendar_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub label_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub start_at: Option<i64>,
    #[serde(default)]
    pub end_at: Option<i64>,
    #[serde(default)]
    pub all_day: bool,
    /// Empty, or `[rule, exdate...]`.
    #[serde(default)]
    pub recurrences: Option<Vec<String>>,
    /// Set when the event was deleted server-side.
    #[serde(default)]
    pub deactivated_at: Option<i64>,
}

/// One page of `GET /calendar/{id}/events/sync`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncPage {
    /// Kept as raw JSON so one bad record cannot fail the whole page.
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
    /// More pages follow.
    #[serde(default)]
    pub chunk: bool,
    /// Cursor for the next request, in epoch milliseconds.
    pub since: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarList {
    #[serde(default)]
    pub calendars: Vec<RawCalendar>,
}

/// Calendar metadata from `GET /calendars`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCalendar {
    #[serde(deserialize_with = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alias_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub calendar_users: Vec<RawUser>,
    #[serde(default)]
    pub calendar_labels: Vec<RawLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    #[serde(deserialize_with = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLabel {
    #[serde(deserialize_with = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    WireId::deserialize(deserializer).map(String::from)
}

fn opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<WireId>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_event_accepts_numeric_ids_and_nulls() {
        let raw: RawEvent = serde_json::from_value(json!({
            "id": "ev1",
            "calendar_id": 12345,
            "author_id": 7,
            "label_id": null,
            "title": "Dentist",
            "updated_at": 1_704_067_200_000i64,
            "start_at": 1_704_067_200_000i64,
            "end_at": 1_704_070_800_000i64,
            "all_day": false,
            "recurrences": null,
        }))
        .unwrap();

        assert_eq!(raw.id.as_deref(), Some("ev1"));
        assert_eq!(raw.calendar_id.as_deref(), Some("12345"));
        assert_eq!(raw.author_id.as_deref(), Some("7"));
        assert_eq!(raw.label_id, None);
        assert_eq!(raw.recurrences, None);
        assert_eq!(raw.deactivated_at, None);
    }

    #[test]
    fn sync_page_keeps_records_raw() {
        let page: SyncPage = serde_json::from_value(json!({
            "events": [{"id": "a"}, {"id": ["not", "an", "id"]}],
            "chunk": true,
            "since": 42,
        }))
        .unwrap();

        assert_eq!(page.events.len(), 2);
        assert!(page.chunk);
        assert_eq!(page.since, Some(42));
    }

    #[test]
    fn calendar_metadata() {
        let list: CalendarList = serde_json::from_value(json!({
            "calendars": [{
                "id": 99,
                "name": "Family",
                "alias_code": "abc",
                "created_at": 1_600_000_000_000i64,
                "calendar_users": [{"id": 1, "name": "Ruth"}],
                "calendar_labels": [{"id": 3, "name": "Work", "color": "#2ecc87"}],
            }]
        }))
        .unwrap();

        let calendar = &list.calendars[0];
        assert_eq!(calendar.id, "99");
        assert_eq!(calendar.calendar_users[0].id, "1");
        assert_eq!(calendar.calendar_labels[0].color, "#2ecc87");
    }
}
