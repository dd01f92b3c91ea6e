pub mod calendars;
pub mod events;
pub mod init;
pub mod watch;

use anyhow::Result;
use ttsync_core::remote::{HttpTransport, SyncClient};
use ttsync_core::{Calendar, TtConfig};

pub type HttpCalendar = Calendar<HttpTransport, TtConfig>;

pub fn client(config: &TtConfig) -> SyncClient<HttpTransport, TtConfig> {
    SyncClient::new(HttpTransport::from_config(config), config.clone())
}

/// Calendars matching `filter`, falling back to the configured calendar.
pub async fn resolve_calendars(config: &TtConfig, filter: Option<&str>) -> Result<Vec<HttpCalendar>> {
    let filter = filter.or(config.calendar.as_deref());
    let mut client = client(config);

    let Some(calendars) = Calendar::discover(&mut client, filter).await? else {
        anyhow::bail!("Could not reach TimeTree; try again later");
    };

    if calendars.is_empty() {
        match filter {
            Some(name) => anyhow::bail!(
                "No calendar named '{}'.\n\nList the available ones with:\n  ttsync calendars",
                name
            ),
            None => anyhow::bail!("This account has no calendars"),
        }
    }

    Ok(calendars)
}
