mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ttsync_core::TtConfig;

#[derive(Parser)]
#[command(name = "ttsync")]
#[command(about = "Pull TimeTree calendars and list or watch their events")]
struct Cli {
    /// Log sync activity to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.config/ttsync/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init,
    /// List the calendars visible to the account
    Calendars,
    /// Fetch calendars and list their events, grouped by day
    Events {
        /// Only show this calendar (by name)
        #[arg(short, long)]
        calendar: Option<String>,

        /// Show events from this date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,

        /// Show events until this date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "days")]
        to: Option<String>,

        /// Number of days to show from `--from`
        #[arg(short, long, default_value_t = 7)]
        days: u32,
    },
    /// Keep calendars in sync and print what changes
    Watch {
        /// Only watch this calendar (by name)
        #[arg(short, long)]
        calendar: Option<String>,

        /// Seconds between refreshes (defaults to refresh_interval_secs)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => TtConfig::config_path()?,
    };

    match cli.command {
        Commands::Init => commands::init::run(&config_path),
        Commands::Calendars => {
            let config = load_config(&config_path)?;
            commands::calendars::run(&config).await
        }
        Commands::Events {
            calendar,
            from,
            to,
            days,
        } => {
            let config = load_config(&config_path)?;
            let window = commands::events::Window::from_args(from.as_deref(), to.as_deref(), days)?;
            commands::events::run(&config, calendar.as_deref(), window).await
        }
        Commands::Watch { calendar, interval } => {
            let config = load_config(&config_path)?;
            commands::watch::run(&config, calendar.as_deref(), interval).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info,ttsync=debug,ttsync_core=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: &std::path::Path) -> Result<TtConfig> {
    if !path.exists() && std::env::var_os("TTSYNC_USERNAME").is_none() {
        anyhow::bail!(
            "No config found at {}.\n\n\
            Create one with:\n  \
            ttsync init",
            path.display()
        );
    }

    TtConfig::load_from(path).with_context(|| format!("Failed to load {}", path.display()))
}
