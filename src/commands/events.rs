use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use ttsync_core::{Period, SyncOutcome, TimeValue, TtConfig, sort_chronologically};

use crate::render;

/// Query window for `ttsync events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: TimeValue,
    pub to: TimeValue,
}

impl Window {
    /// `from` defaults to today; `to` defaults to `days` after `from`.
    pub fn from_args(from: Option<&str>, to: Option<&str>, days: u32) -> Result<Self> {
        let from = match from {
            Some(s) => parse_date(s)?,
            None => TimeValue::now().start_of_day(),
        };
        let to = match to {
            Some(s) => parse_date(s)?,
            None => from.advance(Period::Day, days),
        };

        if to < from {
            anyhow::bail!("--to must not be before --from");
        }
        Ok(Window { from, to })
    }
}

fn parse_date(s: &str) -> Result<TimeValue> {
    s.parse::<TimeValue>()
        .ok()
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub async fn run(config: &TtConfig, calendar: Option<&str>, window: Window) -> Result<()> {
    let mut calendars = super::resolve_calendars(config, calendar).await?;

    for (i, cal) in calendars.iter_mut().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", render::Render::render(&*cal));

        match cal.fetch(None, None).await {
            Ok(SyncOutcome::Applied(_)) => {}
            Ok(SyncOutcome::Skipped) => {
                println!("   {}", "Could not reach TimeTree, skipped".yellow());
                continue;
            }
            Err(e) => {
                println!("   {}", e.to_string().red());
                continue;
            }
        }

        let mut entries = cal.events_between(window.from, window.to, true);
        sort_chronologically(&mut entries);

        for line in render::render_entries(cal, &entries) {
            println!("{}", line);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_to_days_after_from() {
        let window = Window::from_args(Some("2024-03-01"), None, 7).unwrap();
        assert_eq!(window.from, "2024-03-01T00:00:00Z".parse().unwrap());
        assert_eq!(window.to, "2024-03-08T00:00:00Z".parse().unwrap());
    }

    #[test]
    fn window_rejects_inverted_and_invalid_dates() {
        assert!(Window::from_args(Some("2024-03-08"), Some("2024-03-01"), 7).is_err());
        assert!(Window::from_args(Some("next tuesday"), None, 7).is_err());
    }
}
