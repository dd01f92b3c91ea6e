//! Terminal rendering for ttsync-core types.
//!
//! Extension traits that add colored output using owo_colors.

use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;
use ttsync_core::remote::{CredentialsProvider, Transport};
use ttsync_core::{Calendar, CalendarEntry, Label, SyncStats, TimeValue};

pub trait Render {
    fn render(&self) -> String;
}

impl<T, P> Render for Calendar<T, P> {
    fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("📅 {} {}", self.name.bold(), format!("({})", alias).dimmed()),
            None => format!("📅 {}", self.name.bold()),
        }
    }
}

impl Render for Label {
    fn render(&self) -> String {
        match hex_colour(&self.colour) {
            Some((r, g, b)) => self.name.truecolor(r, g, b).to_string(),
            None => self.name.clone(),
        }
    }
}

impl Render for SyncStats {
    fn render(&self) -> String {
        let mut parts = Vec::new();
        if self.created > 0 {
            parts.push(format!("+{}", self.created).green().to_string());
        }
        if self.updated > 0 {
            parts.push(format!("~{}", self.updated).yellow().to_string());
        }
        if self.deleted > 0 {
            parts.push(format!("-{}", self.deleted).red().to_string());
        }
        if self.rejected > 0 {
            parts.push(format!("({} unreadable)", self.rejected).dimmed().to_string());
        }
        parts.join(" ")
    }
}

/// `#rrggbb` to its components.
fn hex_colour(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Entries grouped under day headings, one line per entry.
/// `entries` should already be in chronological order.
pub fn render_entries<T, P>(cal: &Calendar<T, P>, entries: &[CalendarEntry<'_>]) -> Vec<String>
where
    T: Transport,
    P: CredentialsProvider,
{
    if entries.is_empty() {
        return vec![format!("   {}", "No events".dimmed())];
    }

    let today = Local::now().date_naive();
    let mut lines = Vec::new();
    let mut current_date: Option<NaiveDate> = None;

    for entry in entries {
        let date = local_date(entry.start());
        if current_date != Some(date) {
            lines.push(format!("   {}", date_label(date, today).bold()));
            current_date = Some(date);
        }

        let all_day = cal.master_for(entry).map(|m| m.all_day).unwrap_or(false);
        let time = if all_day {
            format!("{:>7}", "all-day")
        } else {
            format!("{:>7}", local_time(entry.start()))
        };

        let mut line = format!("     {} {}", time, entry.title());
        if entry.is_occurrence() {
            line.push_str(&format!(" {}", "↻".dimmed()));
        }
        if let Ok(Some(label)) = cal.label_for(entry) {
            line.push_str(&format!(" [{}]", label.render()));
        }
        if let Ok(Some(author)) = cal.author_for(entry) {
            line.push_str(&format!(" {}", author.dimmed()));
        }
        lines.push(line);
    }

    lines
}

fn local_date(instant: TimeValue) -> NaiveDate {
    instant.to_native().with_timezone(&Local).date_naive()
}

fn local_time(instant: TimeValue) -> String {
    instant.to_native().with_timezone(&Local).format("%H:%M").to_string()
}

/// "Today", "Tomorrow", or e.g. "Wed Feb 25".
fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_labels() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 24).unwrap();
        assert_eq!(date_label(today, today), "Today");
        assert_eq!(date_label(today.succ_opt().unwrap(), today), "Tomorrow");
        assert_eq!(
            date_label(NaiveDate::from_ymd_opt(2025, 2, 26).unwrap(), today),
            "Wed Feb 26"
        );
    }

    #[test]
    fn label_colours() {
        assert_eq!(hex_colour("#2ecc87"), Some((0x2e, 0xcc, 0x87)));
        assert_eq!(hex_colour("2ecc87"), None);
        assert_eq!(hex_colour("#zzzzzz"), None);
    }

    #[test]
    fn stats_omit_zero_counts() {
        let stats = SyncStats {
            created: 2,
            ..SyncStats::default()
        };
        let rendered = stats.render();
        assert!(rendered.contains("+2"));
        assert!(!rendered.contains('~'));
    }
}
