//! Session-holding client for the sync API.
//!
//! Every remote call goes through `get_with_retry`: up to `MAX_ATTEMPTS`
//! tries, logging in again before each retry. Running out of attempts is
//! not an error; the caller receives `None` and skips this cycle. A sign-in
//! that cannot reach the service counts as a failed attempt; one the service
//! rejects is returned as an error.

use serde::de::DeserializeOwned;

use crate::constants::MAX_ATTEMPTS;
use crate::error::{TtError, TtResult};
use crate::remote::protocol::{CalendarList, RawCalendar, SyncPage};
use crate::remote::transport::{CredentialsProvider, SessionId, Transport};

/// Records accumulated across every page of one delta feed.
#[derive(Debug, Clone, Default)]
pub struct SyncFeed {
    pub records: Vec<serde_json::Value>,
    /// Cursor returned by the last page.
    pub cursor: i64,
    pub pages: usize,
}

#[derive(Debug, Clone)]
pub struct SyncClient<T, P> {
    transport: T,
    credentials: P,
    session: Option<SessionId>,
}

impl<T: Transport, P: CredentialsProvider> SyncClient<T, P> {
    pub fn new(transport: T, credentials: P) -> Self {
        SyncClient {
            transport,
            credentials,
            session: None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Obtain a fresh session, replacing any held one.
    pub async fn login(&mut self) -> TtResult<()> {
        let login = self.credentials.credentials()?;
        tracing::debug!(username = %login.username, "logging in");
        let session = self.transport.login(&login).await?;
        self.session = Some(session);
        Ok(())
    }

    async fn session(&mut self) -> TtResult<SessionId> {
        if self.session.is_none() {
            self.login().await?;
        }
        self.session
            .clone()
            .ok_or_else(|| TtError::Auth("no session after login".into()))
    }

    /// GET `path` and decode it, retrying transport failures with re-login.
    pub async fn get_with_retry<R: DeserializeOwned>(&mut self, path: &str) -> TtResult<Option<R>> {
        for attempt in 1..=MAX_ATTEMPTS {
            let failure = match self.attempt(path, attempt > 1).await {
                Ok(decoded) => return Ok(Some(decoded)),
                Err(TtError::Transport(message)) => message,
                Err(other) => return Err(other),
            };
            tracing::warn!(path, attempt, error = %failure, "request failed");
        }

        tracing::warn!(path, attempts = MAX_ATTEMPTS, "giving up for this cycle");
        Ok(None)
    }

    /// One try of `get_with_retry`. Unreachable sign-in and undecodable
    /// bodies both surface as `Transport` so they count as a failed attempt.
    async fn attempt<R: DeserializeOwned>(&mut self, path: &str, relogin: bool) -> TtResult<R> {
        if relogin {
            self.login().await?;
        }
        let session = self.session().await?;
        let body = self.transport.get_json(&session, path).await?;
        serde_json::from_value(body)
            .map_err(|e| TtError::Transport(format!("unexpected response shape: {}", e)))
    }

    /// All calendars of the account, optionally only those named `name_filter`.
    pub async fn calendars(&mut self, name_filter: Option<&str>) -> TtResult<Option<Vec<RawCalendar>>> {
        let Some(list) = self.get_with_retry::<CalendarList>("/calendars?since=0").await? else {
            return Ok(None);
        };

        let calendars = list
            .calendars
            .into_iter()
            .filter(|c| name_filter.is_none_or(|name| c.name == name))
            .collect();
        Ok(Some(calendars))
    }

    /// Delta feed of `calendar_id` from `cursor`, following `chunk` pages.
    ///
    /// Returns `None` if any page could not be retrieved; a partial feed is
    /// never handed out.
    pub async fn events_since(&mut self, calendar_id: &str, cursor: i64) -> TtResult<Option<SyncFeed>> {
        let mut feed = SyncFeed {
            cursor,
            ..SyncFeed::default()
        };

        loop {
            let path = format!("/calendar/{}/events/sync?since={}", calendar_id, feed.cursor);
            let Some(page) = self.get_with_retry::<SyncPage>(&path).await? else {
                return Ok(None);
            };

            feed.pages += 1;
            feed.records.extend(page.events);
            let next = page.since.unwrap_or(feed.cursor);
            let advanced = next != feed.cursor;
            feed.cursor = next;

            if !page.chunk {
                break;
            }
            if !advanced {
                tracing::warn!(calendar_id, cursor = feed.cursor, "chunked feed did not advance its cursor");
                break;
            }
        }

        tracing::debug!(
            calendar_id,
            pages = feed.pages,
            records = feed.records.len(),
            "delta feed retrieved"
        );
        Ok(Some(feed))
    }
}
