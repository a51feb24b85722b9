//! lapline - Motorsport results pipeline
//!
//! Fetches paginated race data from an Ergast-compatible API into
//! timestamped JSON artifacts and consolidates them into one CSV per endpoint.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "lapline")]
#[command(about = "Fetch and consolidate motorsport race results")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./lapline.toml or ~/.config/lapline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every page of an endpoint for the given seasons
    Fetch(cmd::fetch::FetchArgs),
    /// Consolidate fetched artifacts into a deduplicated CSV
    Build(cmd::build::BuildArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = Arc::new(lapline_core::ProgressContext::new());

    // TTY: warn unless --debug, the spinners show activity.
    // non-TTY: info, logs are the only progress indicator.
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    lapline_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Fetch(args) => cmd::fetch::run(args, &config, &progress),
        Command::Build(args) => cmd::build::run(args, &config),
        Command::Config => {
            cmd::print_table(
                "Setting",
                &[
                    ("Raw directory", config.data.raw_dir.display().to_string()),
                    ("Output directory", config.data.output_dir.display().to_string()),
                    ("Base URL", config.api.base_url.clone()),
                    ("Envelope", config.api.envelope.clone()),
                    ("Page size", config.api.page_size.to_string()),
                    ("Offset cap (no total)", config.api.fallback_offset_cap.to_string()),
                    ("Page delay", format!("{}ms", config.api.page_delay_ms)),
                    ("Max retries", config.retry.max_retries.to_string()),
                    ("Backoff", format!("{}s", config.retry.backoff_secs)),
                    ("Seasons", cmd::fmt_seasons(&config.fetch.seasons)),
                ],
            );
            Ok(())
        }
    }
}
