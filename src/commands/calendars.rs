use anyhow::Result;
use owo_colors::OwoColorize;
use ttsync_core::{Calendar, TtConfig};

use crate::render::Render;

/// Every calendar of the account, ignoring any configured calendar filter.
pub async fn run(config: &TtConfig) -> Result<()> {
    let mut client = super::client(config);
    let Some(calendars) = Calendar::discover(&mut client, None).await? else {
        anyhow::bail!("Could not reach TimeTree; try again later");
    };

    if calendars.is_empty() {
        println!("{}", "No calendars found".dimmed());
        return Ok(());
    }

    for calendar in &calendars {
        println!("{}", calendar.render());

        let mut users: Vec<&str> = calendar.known_users.values().map(String::as_str).collect();
        users.sort_unstable();
        if !users.is_empty() {
            println!("   {} {}", "members:".dimmed(), users.join(", "));
        }

        let mut labels: Vec<_> = calendar.label_data.values().collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        if !labels.is_empty() {
            let names: Vec<String> = labels.iter().map(|l| l.render()).collect();
            println!("   {} {}", "labels:".dimmed(), names.join(", "));
        }
    }

    Ok(())
}
