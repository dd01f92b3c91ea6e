//! End-to-end sync against a mocked TimeTree API.

use serde_json::json;
use ttsync_core::remote::{HttpTransport, Login, SyncClient};
use ttsync_core::{Calendar, Period, SyncOutcome, TimeValue, sort_chronologically};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ms(s: &str) -> i64 {
    s.parse::<TimeValue>().unwrap().to_epoch_millis()
}

async fn server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/auth/email/signin"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "_session_id=abc; path=/"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars"))
        .and(header("cookie", "_session_id=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calendars": [
                {
                    "id": 1,
                    "name": "Family",
                    "created_at": ms("2023-06-01T00:00:00Z"),
                    "calendar_users": [{"id": 10, "name": "Ruth"}],
                    "calendar_labels": [{"id": 3, "name": "School", "color": "#2ecc87"}],
                },
                {"id": 2, "name": "Work", "created_at": 0},
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendar/1/events/sync"))
        .and(query_param("since", ms("2023-06-01T00:00:00Z").to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{
                "id": "swim",
                "calendar_id": 1,
                "author_id": 10,
                "label_id": 3,
                "title": "Swimming",
                "updated_at": 1000,
                "start_at": ms("2024-01-01T17:00:00Z"),
                "end_at": ms("2024-01-01T18:00:00Z"),
                "all_day": false,
                "recurrences": [
                    "RRULE:FREQ=WEEKLY;INTERVAL=2;UNTIL=20240131T000000Z",
                    "EXDATE:20240115T170000Z",
                ],
            }],
            "chunk": true,
            "since": 1000,
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendar/1/events/sync"))
        .and(query_param("since", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{
                "id": "dentist",
                "calendar_id": 1,
                "author_id": 10,
                "title": "Dentist",
                "updated_at": 1500,
                "start_at": ms("2024-01-10T00:00:00Z"),
                "end_at": ms("2024-01-10T00:00:00Z"),
                "all_day": true,
            }],
            "chunk": false,
            "since": 1500,
        })))
        .mount(&server)
        .await;

    server
}

fn login() -> Login {
    Login {
        username: "ruth@example.com".into(),
        password: "secret".into(),
    }
}

#[tokio::test]
async fn discover_fetch_and_query_a_calendar() {
    let server = server().await;
    let mut client = SyncClient::new(HttpTransport::new(server.uri(), "web/test"), login());

    let mut calendars = Calendar::discover(&mut client, Some("Family"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(calendars.len(), 1);
    let calendar = &mut calendars[0];

    let outcome = calendar
        .fetch(Some("2023-01-01".parse().unwrap()), None)
        .await
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::Applied(stats) if stats.created == 2));
    assert_eq!(calendar.cursor(), Some(1500));

    let dentist = &calendar.events()[0];
    assert!(dentist.all_day);
    assert_eq!(dentist.end(), "2024-01-10T23:59:59.999Z".parse().unwrap());

    let from: TimeValue = "2024-01-01".parse().unwrap();
    let mut entries = calendar.events_between(from, from.advance(Period::Month, 1), true);
    sort_chronologically(&mut entries);

    let summary: Vec<(&str, TimeValue)> = entries.iter().map(|e| (e.title(), e.start())).collect();
    assert_eq!(
        summary,
        vec![
            ("Swimming", "2024-01-01T17:00:00Z".parse().unwrap()),
            ("Dentist", "2024-01-10T00:00:00Z".parse().unwrap()),
            ("Swimming", "2024-01-29T17:00:00Z".parse().unwrap()),
        ]
    );

    for entry in &entries {
        assert_eq!(calendar.author_for(entry).unwrap(), Some("Ruth"));
    }
    assert_eq!(calendar.label_for(&entries[0]).unwrap().unwrap().name, "School");
    assert_eq!(calendar.label_for(&entries[1]).unwrap(), None);
}
