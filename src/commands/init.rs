use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use ttsync_core::TtConfig;

pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists at {}", path.display().dimmed());
        return Ok(());
    }

    TtConfig::create_default_config(path)?;

    println!("{} {}", "Created".green(), path.display());
    println!("Fill in your TimeTree username and password, then run:\n  ttsync calendars");
    Ok(())
}
