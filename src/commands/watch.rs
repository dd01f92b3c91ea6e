use std::time::Duration;

use anyhow::Result;
use owo_colors::OwoColorize;
use ttsync_core::{Period, SyncOutcome, TimeValue, TtConfig, sort_chronologically};

use super::HttpCalendar;
use crate::render::{self, Render};

/// Days of upcoming events printed after each change.
const UPCOMING_DAYS: u32 = 3;

pub async fn run(config: &TtConfig, calendar: Option<&str>, interval: Option<u64>) -> Result<()> {
    let mut calendars = super::resolve_calendars(config, calendar).await?;
    let period = Duration::from_secs(interval.unwrap_or(config.refresh_interval_secs).max(1));

    for cal in &mut calendars {
        let outcome = cal.fetch(None, None).await?;
        report(cal, outcome);
    }

    println!(
        "{}",
        format!("Watching, refreshing every {}s (Ctrl-C to stop)", period.as_secs()).dimmed()
    );

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!();
                return Ok(());
            }
        }

        for cal in &mut calendars {
            let outcome = cal.refresh().await?;
            report(cal, outcome);
        }
    }
}

fn report(cal: &HttpCalendar, outcome: SyncOutcome) {
    let stats = match outcome {
        SyncOutcome::Applied(stats) => stats,
        SyncOutcome::Skipped => {
            tracing::warn!(calendar = %cal, "TimeTree unreachable, will retry next cycle");
            return;
        }
    };

    if stats.created == 0 && stats.updated == 0 && stats.deleted == 0 {
        tracing::debug!(calendar = %cal, "no changes");
        return;
    }

    println!("{} {}", cal.render(), stats.render());

    let now = TimeValue::now();
    let mut entries = cal.events_between(now, now.advance(Period::Day, UPCOMING_DAYS), true);
    sort_chronologically(&mut entries);
    for line in render::render_entries(cal, &entries) {
        println!("{}", line);
    }
}
